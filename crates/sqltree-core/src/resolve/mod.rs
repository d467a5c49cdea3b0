//! Schema resolution.
//!
//! [`resolve`] computes the [`Schema`] a relation produces by folding over
//! the tree. Base tables come from CTE bindings, pre-bound schemas or a
//! [`Catalog`]; everything else is derived.
//!
//! ```rust
//! use sqltree_core::ast::{DataType, Identifier, QualifiedName, Relation};
//! use sqltree_core::resolve::{resolve, MemoryCatalog, ResolutionContext};
//!
//! let catalog = MemoryCatalog::new().with_table(
//!     QualifiedName::single("t"),
//!     vec![(Identifier::new("x"), DataType::Bigint)],
//! );
//! let ctx = ResolutionContext::new(&catalog);
//! let schema = resolve(&Relation::table(QualifiedName::single("t")).alias("a"), &ctx).unwrap();
//! assert_eq!(schema.relation_ids, vec![QualifiedName::single("a")]);
//! ```

mod catalog;
mod functions;
mod typing;

use core::fmt;

use tracing::{debug, trace};

use crate::ast::{
    AliasedRelation, Cte, DataType, Expr, Identifier, Join, JoinCriteria, QualifiedName, Query,
    QueryBody, Relation, Select, SelectItem, SetOperation, Table, Unnest, ValuesQuery,
};
use crate::config::ResolveOptions;
use crate::error::{ResolutionError, Result};
use crate::schema::{common_supertype, MergeMode, Schema, SchemaField};

pub use catalog::{Catalog, EmptyCatalog, MemoryCatalog};
pub use functions::return_type;
pub use typing::{infer_type, ColumnMatch, Scope};

/// Everything resolution can see besides the tree itself.
///
/// Contexts are immutable; nested scopes are derived with [`with_cte`],
/// [`with_outer`] and [`without_outer`].
///
/// [`with_cte`]: ResolutionContext::with_cte
/// [`with_outer`]: ResolutionContext::with_outer
/// [`without_outer`]: ResolutionContext::without_outer
#[derive(Clone)]
pub struct ResolutionContext<'a> {
    catalog: &'a dyn Catalog,
    options: ResolveOptions,
    /// Innermost binding last.
    ctes: Vec<(Identifier, Schema)>,
    outer: Option<Schema>,
}

impl fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("options", &self.options)
            .field("ctes", &self.ctes)
            .field("outer", &self.outer)
            .finish_non_exhaustive()
    }
}

impl<'a> ResolutionContext<'a> {
    /// Creates a context with default options.
    #[must_use]
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self::with_options(catalog, ResolveOptions::default())
    }

    /// Creates a context with explicit options.
    #[must_use]
    pub fn with_options(catalog: &'a dyn Catalog, options: ResolveOptions) -> Self {
        Self {
            catalog,
            options,
            ctes: vec![],
            outer: None,
        }
    }

    /// The resolution options.
    #[must_use]
    pub const fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// The outer scope, if any.
    #[must_use]
    pub const fn outer(&self) -> Option<&Schema> {
        self.outer.as_ref()
    }

    /// Returns a context with `name` bound to `schema`, shadowing outer
    /// bindings of the same name.
    #[must_use]
    pub fn with_cte(&self, name: Identifier, schema: Schema) -> Self {
        let mut next = self.clone();
        next.ctes.push((name, schema));
        next
    }

    /// Returns a context whose outer scope is `outer`.
    #[must_use]
    pub fn with_outer(&self, outer: Schema) -> Self {
        Self {
            outer: Some(outer),
            ..self.clone()
        }
    }

    /// Returns a context with no outer scope.
    #[must_use]
    pub fn without_outer(&self) -> Self {
        Self {
            outer: None,
            ..self.clone()
        }
    }

    /// Looks up a CTE binding, innermost first.
    #[must_use]
    pub fn cte(&self, name: &Identifier) -> Option<&Schema> {
        self.ctes
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, schema)| schema)
    }

    fn scope<'s>(&'s self, local: &'s Schema) -> Scope<'s> {
        Scope::new(local)
            .with_outer(self.outer.as_ref())
            .with_context(self)
    }
}

fn fail<T>(error: ResolutionError) -> Result<T> {
    debug!(%error, "resolution failed");
    Err(error)
}

/// Resolves the schema produced by `relation`.
///
/// # Errors
///
/// Returns a [`ResolutionError`] when a table is unknown, aliases collide,
/// arities disagree or types cannot be unified.
pub fn resolve(relation: &Relation, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    match relation {
        Relation::Table(table) => resolve_table(table, ctx),
        Relation::Aliased(aliased) => resolve_aliased(aliased, ctx),
        Relation::Join(join) => resolve_join(join, ctx),
        Relation::SetOperation(operation) => resolve_set_operation(operation, ctx),
        Relation::Query(query) => {
            trace!("resolving subquery");
            resolve_query(query, &ctx.without_outer())
        }
        Relation::Values(values) => resolve_values(values, ctx),
        Relation::Unnest(unnest) => resolve_unnest(unnest, ctx),
        Relation::Lateral(lateral) => {
            trace!("resolving lateral");
            resolve_query(&lateral.query, ctx)
        }
        Relation::TableSample(sample) => {
            trace!(method = sample.method.as_str(), "resolving sample");
            resolve(&sample.relation, ctx)
        }
    }
}

fn resolve_table(table: &Table, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(name = %table.name, "resolving table");
    let name = &table.name;
    let bound = match name.parts() {
        [single] => ctx.cte(single).cloned(),
        _ => None,
    };
    let schema = bound
        .or_else(|| table.schema.clone())
        .or_else(|| ctx.catalog.lookup_schema(name));
    match schema {
        Some(schema) => Ok(schema.with_source(name.clone())),
        None if ctx.options.allow_unknown_relations => {
            debug!(name = %name, "unknown relation resolved to an empty schema");
            Ok(Schema::new(vec![], vec![name.clone()]))
        }
        None => fail(ResolutionError::UnknownRelation(name.clone())),
    }
}

fn resolve_aliased(aliased: &AliasedRelation, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(alias = %aliased.alias, "resolving aliased relation");
    let mut schema = resolve(&aliased.relation, ctx)?;
    rename_columns(&mut schema.fields, &aliased.alias, &aliased.columns)?;
    Ok(schema.with_source(QualifiedName::single(aliased.alias.clone())))
}

/// Applies a column alias list positionally; an empty list keeps the names.
fn rename_columns(
    fields: &mut [SchemaField],
    relation: &Identifier,
    columns: &[Identifier],
) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    if columns.len() != fields.len() {
        return fail(ResolutionError::ArityMismatch {
            relation: relation.clone(),
            expected: columns.len(),
            actual: fields.len(),
        });
    }
    for (field, name) in fields.iter_mut().zip(columns) {
        field.name = Some(name.clone());
    }
    Ok(())
}

fn check_disjoint(left: &Schema, right: &Schema) -> Result<()> {
    match right
        .relation_ids
        .iter()
        .find(|id| left.relation_ids.contains(id))
    {
        Some(id) => fail(ResolutionError::DuplicateRelationAlias(id.clone())),
        None => Ok(()),
    }
}

fn resolve_join(join: &Join, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(join_type = join.join_type.as_str(), "resolving join");
    let left = resolve(&join.left, ctx)?;
    let right_outer = match ctx.outer() {
        Some(outer) => outer.merge(&left, MergeMode::Append)?,
        None => left.clone(),
    };
    let right = resolve(&join.right, &ctx.with_outer(right_outer))?;
    check_disjoint(&left, &right)?;

    match &join.criteria {
        JoinCriteria::On(_) | JoinCriteria::None => left.merge(&right, MergeMode::Append),
        JoinCriteria::Using(columns) => coalesce_join(&left, &right, columns),
        JoinCriteria::Natural => {
            let mut common: Vec<Identifier> = vec![];
            for name in left.fields.iter().filter_map(|field| field.name.as_ref()) {
                let shared = right.fields.iter().any(|field| field.name.as_ref() == Some(name));
                if shared && !common.contains(name) {
                    common.push(name.clone());
                }
            }
            if common.is_empty() {
                trace!("natural join without common columns");
                left.merge(&right, MergeMode::Append)
            } else {
                coalesce_join(&left, &right, &common)
            }
        }
    }
}

/// Finds the single unqualified field called `name`.
fn using_field<'s>(schema: &'s Schema, name: &Identifier) -> Result<(usize, &'s SchemaField)> {
    match schema.field_named(name, &[]) {
        Ok(Some(found)) => Ok(found),
        Ok(None) => fail(ResolutionError::UnknownColumn(name.clone())),
        Err(error) => fail(error),
    }
}

/// Builds the schema of a USING or NATURAL join: the coalesced columns
/// first, then the remaining left and right fields.
fn coalesce_join(left: &Schema, right: &Schema, columns: &[Identifier]) -> Result<Schema> {
    let mut fields = Vec::with_capacity(left.len() + right.len());
    let mut used_left = vec![];
    let mut used_right = vec![];
    for name in columns {
        let (left_index, left_field) = using_field(left, name)?;
        let (right_index, right_field) = using_field(right, name)?;
        let Some(data_type) = common_supertype(&left_field.data_type, &right_field.data_type)
        else {
            return fail(ResolutionError::TypeMismatch {
                context: format!("USING column {name}"),
                left: left_field.data_type.clone(),
                right: right_field.data_type.clone(),
            });
        };
        fields.push(SchemaField {
            name: left_field.name.clone(),
            data_type,
            source: None,
        });
        used_left.push(left_index);
        used_right.push(right_index);
    }
    let remaining = |schema: &Schema, used: &[usize]| {
        schema
            .fields
            .iter()
            .enumerate()
            .filter(|(index, _)| !used.contains(index))
            .map(|(_, field)| field.clone())
            .collect::<Vec<_>>()
    };
    fields.extend(remaining(left, &used_left));
    fields.extend(remaining(right, &used_right));

    let relation_ids = left
        .relation_ids
        .iter()
        .chain(&right.relation_ids)
        .cloned()
        .collect();
    Ok(Schema::new(fields, relation_ids))
}

fn resolve_set_operation(operation: &SetOperation, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(operator = operation.operator.as_str(), "resolving set operation");
    let inner = ctx.without_outer();
    let left = resolve_query(&operation.left, &inner)?;
    let right = resolve_query(&operation.right, &inner)?;
    if left.len() != right.len() {
        return fail(ResolutionError::ColumnCountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    let fields = left
        .fields
        .iter()
        .zip(&right.fields)
        .enumerate()
        .map(|(position, (l, r))| {
            match common_supertype(&l.data_type, &r.data_type) {
                Some(data_type) => Ok(SchemaField {
                    name: l.name.clone(),
                    data_type,
                    source: None,
                }),
                None => fail(ResolutionError::IncompatibleSetOperationTypes {
                    position,
                    left: l.data_type.clone(),
                    right: r.data_type.clone(),
                }),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields, vec![]))
}

fn generated_name(position: usize) -> Identifier {
    Identifier::new(format!("_col{position}"))
}

fn resolve_values(values: &ValuesQuery, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(rows = values.rows().len(), "resolving values");
    let empty = Schema::empty();
    let scope = ctx.scope(&empty);
    let mut columns: Vec<DataType> = vec![];
    for (row, expr) in values.rows().iter().enumerate() {
        let cells: Vec<&Expr> = match expr {
            Expr::Row(items) => items.iter().collect(),
            other => vec![other],
        };
        if row == 0 {
            columns = vec![DataType::Unknown; cells.len()];
        } else if cells.len() != columns.len() {
            return fail(ResolutionError::InconsistentRowArity {
                row,
                expected: columns.len(),
                actual: cells.len(),
            });
        }
        for (position, (column, cell)) in columns.iter_mut().zip(cells).enumerate() {
            let cell_type = infer_type(cell, &scope)?;
            match common_supertype(column, &cell_type) {
                Some(data_type) => *column = data_type,
                None => {
                    return fail(ResolutionError::TypeMismatch {
                        context: format!("VALUES column {position}"),
                        left: column.clone(),
                        right: cell_type,
                    })
                }
            }
        }
    }
    let fields = columns
        .into_iter()
        .enumerate()
        .map(|(position, data_type)| SchemaField::new(generated_name(position), data_type))
        .collect();
    Ok(Schema::new(fields, vec![]))
}

fn resolve_unnest(unnest: &Unnest, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(args = unnest.args().len(), "resolving unnest");
    let empty = Schema::empty();
    let scope = ctx.scope(&empty);
    let mut types = vec![];
    for arg in unnest.args() {
        match infer_type(arg, &scope)? {
            DataType::Array(element) => types.push(*element),
            DataType::Map(key, value) => {
                types.push(*key);
                types.push(*value);
            }
            _ => types.push(DataType::Unknown),
        }
    }
    let mut fields: Vec<SchemaField> = types
        .into_iter()
        .enumerate()
        .map(|(position, data_type)| SchemaField::new(generated_name(position), data_type))
        .collect();
    if unnest.with_ordinality {
        fields.push(SchemaField::new("ordinality", DataType::Bigint));
    }
    Ok(Schema::new(fields, vec![]))
}

/// Resolves the schema produced by a full query, including its WITH clause.
///
/// # Errors
///
/// Returns a [`ResolutionError`] under the same conditions as [`resolve`].
pub fn resolve_query(query: &Query, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    let mut ctx = ctx.clone();
    if let Some(with) = &query.with {
        for (index, cte) in with.ctes.iter().enumerate() {
            if with.ctes[..index].iter().any(|earlier| earlier.name == cte.name) {
                return fail(ResolutionError::DuplicateRelationAlias(QualifiedName::single(
                    cte.name.clone(),
                )));
            }
            let schema = resolve_cte(cte, with.recursive, &ctx)?;
            ctx = ctx.with_cte(cte.name.clone(), schema);
        }
    }
    resolve_body(&query.body, &ctx)
}

fn resolve_cte(cte: &Cte, recursive: bool, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(name = %cte.name, recursive, "resolving cte");
    let body_ctx = if recursive && !cte.columns.is_empty() {
        let fields = cte
            .columns
            .iter()
            .map(|column| SchemaField::new(column.clone(), DataType::Unknown))
            .collect();
        ctx.with_cte(cte.name.clone(), Schema::new(fields, vec![]))
    } else {
        ctx.clone()
    };
    let mut schema = resolve_query(&cte.query, &body_ctx.without_outer())?;
    rename_columns(&mut schema.fields, &cte.name, &cte.columns)?;
    // Every named column of a CTE must be addressable through its name.
    let bound = schema.with_source(QualifiedName::single(cte.name.clone()));
    Schema::empty().merge(&bound, MergeMode::Strict).or_else(fail)
}

fn resolve_body(body: &QueryBody, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    match body {
        QueryBody::Select(select) => resolve_select(select, ctx),
        QueryBody::Table(name) => resolve(&Relation::table(name.clone()), ctx),
        QueryBody::Values(values) => resolve_values(values, ctx),
        QueryBody::SetOperation(operation) => resolve_set_operation(operation, ctx),
        QueryBody::Nested(query) => resolve_query(query, ctx),
    }
}

fn resolve_select(select: &Select, ctx: &ResolutionContext<'_>) -> Result<Schema> {
    trace!(
        items = select.items.len(),
        relations = select.from.len(),
        "resolving select"
    );
    let mut source = Schema::empty();
    for relation in &select.from {
        let visible = match ctx.outer() {
            Some(outer) => outer.merge(&source, MergeMode::Append)?,
            None => source.clone(),
        };
        let schema = resolve(relation, &ctx.with_outer(visible))?;
        check_disjoint(&source, &schema)?;
        source = source.merge(&schema, MergeMode::Append)?;
    }

    let scope = ctx.scope(&source);
    let mut fields = vec![];
    for item in &select.items {
        match item {
            SelectItem::Wildcard { qualifier, aliases } => {
                let mut expanded: Vec<SchemaField> = match qualifier {
                    None => source.fields.clone(),
                    Some(qualifier) => {
                        if !source.has_relation(qualifier.parts()) {
                            return fail(ResolutionError::UnknownRelation(qualifier.clone()));
                        }
                        source
                            .fields_from(qualifier.parts())
                            .into_iter()
                            .cloned()
                            .collect()
                    }
                };
                let label = qualifier
                    .as_ref()
                    .map_or_else(|| Identifier::new("*"), |name| name.name().clone());
                rename_columns(&mut expanded, &label, aliases)?;
                fields.extend(expanded);
            }
            SelectItem::Expr { expr, alias } => {
                let data_type = infer_type(expr, &scope)?;
                let field = match (alias, expr) {
                    (Some(alias), _) => SchemaField::new(alias.clone(), data_type),
                    (None, Expr::Column(name)) => SchemaField::new(name.name().clone(), data_type),
                    (None, _) => SchemaField::anonymous(data_type),
                };
                fields.push(field);
            }
        }
    }
    // The FROM relations are scoped to this SELECT. Its output belongs to
    // whichever relation encloses it, so no inner source or identity leaks.
    let fields = fields.into_iter().map(|field| field.with_source(None)).collect();
    Ok(Schema::new(fields, vec![]))
}
