//! Fluent SELECT builder using the typestate pattern.
//!
//! Clauses that only make sense in some states are only callable there:
//! `build()` needs a projection, joins and `filter()` need a FROM clause,
//! and GROUP BY / HAVING need both.
//!
//! ```rust
//! use sqltree_core::ast::{JoinCriteria, JoinType};
//! use sqltree_core::builder::{col, func, lit_str, select, table};
//!
//! let query = select(vec![col("c.name"), func("count", vec![col("o.id")])])
//!     .from(table("customers").alias("c"))
//!     .join(
//!         table("orders").alias("o"),
//!         JoinType::Left,
//!         JoinCriteria::On(col("o.customer_id").eq(col("c.id"))),
//!     )
//!     .filter(col("c.country").eq(lit_str("NL")))
//!     .group_by(vec![col("c.name")])
//!     .build()
//!     .unwrap();
//!
//! assert!(query.to_string().starts_with("SELECT \"c\".\"name\", count(\"o\".\"id\") FROM"));
//! ```

use std::marker::PhantomData;

use crate::ast::{
    Cte, Expr, GroupBy, GroupingElement, JoinCriteria, JoinType, Limit, OrderTerm, QualifiedName,
    Query, Relation, Select, SelectItem, SetQuantifier, With,
};
use crate::error::ConstructionError;

// Typestate markers (zero-sized types)

/// Marker: no projection item yet.
pub struct NoItems;
/// Marker: at least one projection item.
pub struct HasItems;
/// Marker: no FROM relation yet.
pub struct NoFrom;
/// Marker: at least one FROM relation.
pub struct HasFrom;

#[derive(Default)]
struct Parts {
    ctes: Vec<Cte>,
    distinct: bool,
    items: Vec<SelectItem>,
    from: Vec<Relation>,
    filter: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderTerm>,
    offset: Option<u64>,
    limit: Option<Limit>,
    /// First construction failure, reported by `build()`.
    error: Option<ConstructionError>,
}

/// A SELECT query under construction.
pub struct SelectBuilder<Items, From> {
    parts: Parts,
    _state: PhantomData<(Items, From)>,
}

impl SelectBuilder<NoItems, NoFrom> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parts: Parts::default(),
            _state: PhantomData,
        }
    }
}

impl Default for SelectBuilder<NoItems, NoFrom> {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts a SELECT projecting `items`.
#[must_use]
pub fn select(items: Vec<Expr>) -> SelectBuilder<HasItems, NoFrom> {
    SelectBuilder::new().columns(items)
}

impl<Items, From> SelectBuilder<Items, From> {
    fn into_state<I, F>(self) -> SelectBuilder<I, F> {
        SelectBuilder {
            parts: self.parts,
            _state: PhantomData,
        }
    }

    /// Adds a projection item.
    #[must_use]
    pub fn item(mut self, item: SelectItem) -> SelectBuilder<HasItems, From> {
        self.parts.items.push(item);
        self.into_state()
    }

    /// Projects each expression without an alias.
    #[must_use]
    pub fn columns(mut self, exprs: Vec<Expr>) -> SelectBuilder<HasItems, From> {
        self.parts
            .items
            .extend(exprs.into_iter().map(SelectItem::expr));
        self.into_state()
    }

    /// Projects `expr AS alias`.
    #[must_use]
    pub fn aliased(self, expr: Expr, alias: &str) -> SelectBuilder<HasItems, From> {
        self.item(SelectItem::aliased(expr, alias))
    }

    /// Projects `*`.
    #[must_use]
    pub fn all(self) -> SelectBuilder<HasItems, From> {
        self.item(SelectItem::wildcard())
    }

    /// Adds a relation to the FROM list.
    #[must_use]
    pub fn from(mut self, relation: Relation) -> SelectBuilder<Items, HasFrom> {
        self.parts.from.push(relation);
        self.into_state()
    }

    /// Binds a common table expression.
    #[must_use]
    pub fn with_cte(mut self, name: &str, query: Query) -> Self {
        self.parts.ctes.push(Cte::new(name, query));
        self
    }
}

// Methods available after FROM
impl<Items> SelectBuilder<Items, HasFrom> {
    /// Joins `right` to the last FROM relation.
    ///
    /// Invalid criteria for the join type are reported by `build()`.
    #[must_use]
    pub fn join(mut self, right: Relation, join_type: JoinType, criteria: JoinCriteria) -> Self {
        if let Some(left) = self.parts.from.pop() {
            let joined = match left.clone().join(right, join_type, criteria) {
                Ok(joined) => joined,
                Err(error) => {
                    self.parts.error.get_or_insert(error);
                    left
                }
            };
            self.parts.from.push(joined);
        }
        self
    }

    /// `INNER JOIN right ON condition`.
    #[must_use]
    pub fn inner_join(self, right: Relation, condition: Expr) -> Self {
        self.join(right, JoinType::Inner, JoinCriteria::On(condition))
    }

    /// `LEFT JOIN right ON condition`.
    #[must_use]
    pub fn left_join(self, right: Relation, condition: Expr) -> Self {
        self.join(right, JoinType::Left, JoinCriteria::On(condition))
    }

    /// `CROSS JOIN right`.
    #[must_use]
    pub fn cross_join(self, right: Relation) -> Self {
        self.join(right, JoinType::Cross, JoinCriteria::None)
    }

    /// Adds a WHERE condition, AND-ed with any previous one.
    #[must_use]
    pub fn filter(mut self, condition: Expr) -> Self {
        self.parts.filter = Some(match self.parts.filter.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }
}

// Methods available with a projection
impl<From> SelectBuilder<HasItems, From> {
    /// Sets `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.parts.distinct = true;
        self
    }

    /// Appends ORDER BY terms.
    #[must_use]
    pub fn order_by(mut self, terms: Vec<OrderTerm>) -> Self {
        self.parts.order_by.extend(terms);
        self
    }

    /// Sets `LIMIT n`.
    #[must_use]
    pub fn limit(mut self, count: u64) -> Self {
        self.parts.limit = Some(Limit::Count(count));
        self
    }

    /// Sets `OFFSET n`.
    #[must_use]
    pub fn offset(mut self, count: u64) -> Self {
        self.parts.offset = Some(count);
        self
    }

    /// Assembles the query.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConstructionError`] met while building, or
    /// [`ConstructionError::EmptyProjection`] if every `columns` call was
    /// empty.
    pub fn build(self) -> Result<Query, ConstructionError> {
        let parts = self.parts;
        if let Some(error) = parts.error {
            return Err(error);
        }
        let mut select = Select::new(parts.items)?;
        if parts.distinct {
            select.quantifier = Some(SetQuantifier::Distinct);
        }
        select.from = parts.from;
        select.where_clause = parts.filter;
        if !parts.group_by.is_empty() {
            select.group_by = Some(GroupBy {
                quantifier: None,
                elements: parts
                    .group_by
                    .into_iter()
                    .map(GroupingElement::Expr)
                    .collect(),
            });
        }
        select.having = parts.having;

        let mut query = Query::select(select);
        if !parts.ctes.is_empty() {
            query.with = Some(With {
                recursive: false,
                ctes: parts.ctes,
            });
        }
        query.order_by = parts.order_by;
        query.offset = parts.offset;
        query.limit = parts.limit;
        Ok(query)
    }
}

// Grouping needs both a projection and a FROM clause
impl SelectBuilder<HasItems, HasFrom> {
    /// Appends GROUP BY expressions.
    #[must_use]
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.parts.group_by.extend(exprs);
        self
    }

    /// Adds a HAVING condition, AND-ed with any previous one.
    #[must_use]
    pub fn having(mut self, condition: Expr) -> Self {
        self.parts.having = Some(match self.parts.having.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }
}

fn dotted(name: &str) -> QualifiedName {
    QualifiedName::from_dotted(name).unwrap_or_else(|_| QualifiedName::single(name))
}

/// A column reference; dots separate qualifiers (`"t.c"`).
#[must_use]
pub fn col(name: &str) -> Expr {
    Expr::Column(dotted(name))
}

/// A table reference; dots separate catalog and schema (`"s.t"`).
#[must_use]
pub fn table(name: &str) -> Relation {
    Relation::table(dotted(name))
}

/// A function call.
#[must_use]
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::function(name, args)
}

/// An integer literal.
#[must_use]
pub const fn lit_int(value: i64) -> Expr {
    Expr::integer(value)
}

/// A string literal.
#[must_use]
pub fn lit_str(value: &str) -> Expr {
    Expr::string(value)
}

/// A boolean literal.
#[must_use]
pub const fn lit_bool(value: bool) -> Expr {
    Expr::boolean(value)
}

/// The NULL literal.
#[must_use]
pub const fn lit_null() -> Expr {
    Expr::null()
}
