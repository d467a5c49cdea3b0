//! Table lookup for schema resolution.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ast::{DataType, Identifier, QualifiedName};
use crate::error::ConfigError;
use crate::schema::Schema;

/// Source of base-table schemas.
///
/// Implementations return the columns of a table; the resolver attributes
/// them to the name used in the query.
pub trait Catalog {
    /// Looks up the schema of a base table.
    fn lookup_schema(&self, name: &QualifiedName) -> Option<Schema>;
}

/// A catalog that knows no tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl Catalog for EmptyCatalog {
    fn lookup_schema(&self, _name: &QualifiedName) -> Option<Schema> {
        None
    }
}

impl Catalog for HashMap<QualifiedName, Schema> {
    fn lookup_schema(&self, name: &QualifiedName) -> Option<Schema> {
        self.get(name).cloned()
    }
}

/// An in-memory catalog.
///
/// A lookup matches a registered table exactly, or by suffix when exactly one
/// registered table ends with the requested name (`t` finds `db.t`).
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: Vec<(QualifiedName, Vec<(Identifier, DataType)>)>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    tables: Vec<TableDocument>,
}

#[derive(Debug, Deserialize)]
struct TableDocument {
    name: Vec<String>,
    #[serde(default)]
    columns: Vec<ColumnDocument>,
}

#[derive(Debug, Deserialize)]
struct ColumnDocument {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table, replacing any previous definition.
    pub fn add_table(&mut self, name: QualifiedName, columns: Vec<(Identifier, DataType)>) {
        self.tables.retain(|(existing, _)| *existing != name);
        self.tables.push((name, columns));
    }

    /// Builder form of [`MemoryCatalog::add_table`].
    #[must_use]
    pub fn with_table(mut self, name: QualifiedName, columns: Vec<(Identifier, DataType)>) -> Self {
        self.add_table(name, columns);
        self
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Loads a catalog from JSON:
    ///
    /// ```json
    /// {"tables": [{"name": ["db", "t"], "columns": [{"name": "x", "type": "Bigint"}]}]}
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input and
    /// [`ConfigError::Construction`] for a table without a name.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for table in document.tables {
            let name = QualifiedName::new(table.name.into_iter().map(Identifier::new).collect())?;
            let columns = table
                .columns
                .into_iter()
                .map(|column| (Identifier::new(column.name), column.data_type))
                .collect();
            catalog.add_table(name, columns);
        }
        Ok(catalog)
    }
}

impl Catalog for MemoryCatalog {
    fn lookup_schema(&self, name: &QualifiedName) -> Option<Schema> {
        let found = self
            .tables
            .iter()
            .find(|(registered, _)| registered == name)
            .or_else(|| {
                let mut candidates = self
                    .tables
                    .iter()
                    .filter(|(registered, _)| registered.matches_suffix(name.parts()));
                let first = candidates.next()?;
                candidates.next().is_none().then_some(first)
            })?;
        let (registered, columns) = found;
        Some(Schema::for_table(registered, columns.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let catalog = MemoryCatalog::from_json(
            r#"{"tables": [
                {"name": ["db", "t"], "columns": [
                    {"name": "x", "type": "Bigint"},
                    {"name": "y", "type": {"Varchar": 10}}
                ]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        let schema = catalog
            .lookup_schema(&QualifiedName::from_dotted("db.t").unwrap())
            .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.fields[1].data_type, DataType::Varchar(Some(10)));
    }

    #[test]
    fn test_from_json_rejects_unnamed_table() {
        let result = MemoryCatalog::from_json(r#"{"tables": [{"name": [], "columns": []}]}"#);
        assert!(matches!(result, Err(ConfigError::Construction(_))));
        assert!(matches!(
            MemoryCatalog::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_suffix_lookup_requires_unique_match() {
        let columns = vec![(Identifier::new("x"), DataType::Integer)];
        let catalog = MemoryCatalog::new()
            .with_table(QualifiedName::from_dotted("a.t").unwrap(), columns.clone())
            .with_table(QualifiedName::from_dotted("a.u").unwrap(), columns.clone());
        assert!(catalog.lookup_schema(&QualifiedName::single("T")).is_some());

        let ambiguous = catalog.with_table(QualifiedName::from_dotted("b.t").unwrap(), columns);
        assert!(ambiguous.lookup_schema(&QualifiedName::single("t")).is_none());
        assert!(ambiguous
            .lookup_schema(&QualifiedName::from_dotted("b.t").unwrap())
            .is_some());
    }
}
