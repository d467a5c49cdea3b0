//! Schemas produced by relations.
//!
//! A [`Schema`] lists the fields a relation produces, in order, together
//! with the relation identities that are visible through it (table names and
//! aliases).

pub mod coercion;

use crate::ast::{DataType, Identifier, QualifiedName, RowField};
use crate::error::{ResolutionError, Result};

pub use coercion::common_supertype;

/// One output column of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// Column name; anonymous expressions have none.
    pub name: Option<Identifier>,
    /// Column type.
    pub data_type: DataType,
    /// The relation the column is attributed to.
    pub source: Option<QualifiedName>,
}

impl SchemaField {
    /// Creates a named field without a source.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
            source: None,
        }
    }

    /// Creates an anonymous field.
    #[must_use]
    pub const fn anonymous(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
            source: None,
        }
    }

    /// Sets the source relation.
    #[must_use]
    pub fn with_source(mut self, source: Option<QualifiedName>) -> Self {
        self.source = source;
        self
    }

    /// Returns true if the field is called `name` and, when a qualifier is
    /// given, is sourced from a relation whose name ends with it.
    #[must_use]
    pub fn matches(&self, name: &Identifier, qualifier: &[Identifier]) -> bool {
        if self.name.as_ref() != Some(name) {
            return false;
        }
        qualifier.is_empty()
            || self
                .source
                .as_ref()
                .is_some_and(|source| source.matches_suffix(qualifier))
    }
}

/// How [`Schema::merge`] treats repeated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Keep every field, even exact repeats.
    #[default]
    Append,
    /// Reject a field whose name and source are already present.
    Strict,
}

/// The ordered fields of a relation plus the relation identities visible
/// through it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Output fields, in order.
    pub fields: Vec<SchemaField>,
    /// Names usable to qualify the fields, without duplicates.
    pub relation_ids: Vec<QualifiedName>,
}

impl Schema {
    /// Creates a schema.
    #[must_use]
    pub fn new(fields: Vec<SchemaField>, relation_ids: Vec<QualifiedName>) -> Self {
        let mut schema = Self {
            fields,
            relation_ids: Vec::with_capacity(relation_ids.len()),
        };
        for id in relation_ids {
            schema.add_relation_id(id);
        }
        schema
    }

    /// The schema with no fields and no relation ids; the identity of
    /// [`Schema::merge`].
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            fields: Vec::new(),
            relation_ids: Vec::new(),
        }
    }

    /// Builds the schema of a base table from `(name, type)` pairs.
    #[must_use]
    pub fn for_table(table: &QualifiedName, columns: Vec<(Identifier, DataType)>) -> Self {
        let fields = columns
            .into_iter()
            .map(|(name, data_type)| SchemaField {
                name: Some(name),
                data_type,
                source: Some(table.clone()),
            })
            .collect();
        Self::new(fields, vec![table.clone()])
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn add_relation_id(&mut self, id: QualifiedName) {
        if !self.relation_ids.contains(&id) {
            self.relation_ids.push(id);
        }
    }

    /// Concatenates the fields of `self` and `other` and unions their
    /// relation ids.
    ///
    /// # Errors
    ///
    /// In [`MergeMode::Strict`], returns [`ResolutionError::DuplicateField`]
    /// if a named field of `other` repeats one of `self` with the same source.
    pub fn merge(&self, other: &Self, mode: MergeMode) -> Result<Self> {
        let mut merged = self.clone();
        for field in &other.fields {
            if mode == MergeMode::Strict {
                if let Some(name) = &field.name {
                    let repeated = merged.fields.iter().any(|existing| {
                        existing.name.as_ref() == Some(name) && existing.source == field.source
                    });
                    if repeated {
                        let qualified = match &field.source {
                            Some(source) => format!("{}.{}", source, name),
                            None => name.to_string(),
                        };
                        return Err(ResolutionError::DuplicateField(qualified));
                    }
                }
            }
            merged.fields.push(field.clone());
        }
        for id in &other.relation_ids {
            merged.add_relation_id(id.clone());
        }
        Ok(merged)
    }

    /// Looks up a field by name, optionally qualified.
    ///
    /// Returns the position and the field, or `None` if nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::AmbiguousColumn`] when more than one field
    /// matches.
    pub fn field_named(
        &self,
        name: &Identifier,
        qualifier: &[Identifier],
    ) -> Result<Option<(usize, &SchemaField)>> {
        let mut found = None;
        for (index, field) in self.fields.iter().enumerate() {
            if field.matches(name, qualifier) {
                if found.is_some() {
                    return Err(ResolutionError::AmbiguousColumn(name.clone()));
                }
                found = Some((index, field));
            }
        }
        Ok(found)
    }

    /// Returns the fields attributed to a relation whose name ends with
    /// `qualifier`.
    #[must_use]
    pub fn fields_from(&self, qualifier: &[Identifier]) -> Vec<&SchemaField> {
        self.fields
            .iter()
            .filter(|field| {
                field
                    .source
                    .as_ref()
                    .is_some_and(|source| source.matches_suffix(qualifier))
            })
            .collect()
    }

    /// Returns true if a relation whose name ends with `qualifier` is visible.
    #[must_use]
    pub fn has_relation(&self, qualifier: &[Identifier]) -> bool {
        self.relation_ids
            .iter()
            .any(|id| id.matches_suffix(qualifier))
    }

    /// Re-attributes every field to `source`, which becomes the only
    /// relation id.
    #[must_use]
    pub fn with_source(&self, source: QualifiedName) -> Self {
        let fields = self
            .fields
            .iter()
            .cloned()
            .map(|field| field.with_source(Some(source.clone())))
            .collect();
        Self {
            fields,
            relation_ids: vec![source],
        }
    }

    /// The schema as a `ROW` type, used for scalar subqueries and row values.
    #[must_use]
    pub fn row_type(&self) -> DataType {
        DataType::Row(
            self.fields
                .iter()
                .map(|field| RowField {
                    name: field.name.as_ref().map(|name| name.value.clone()),
                    data_type: field.data_type.clone(),
                })
                .collect(),
        )
    }
}
