//! Identifiers and qualified names.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::borrow::Cow;

use crate::error::ConstructionError;

/// A single SQL name.
///
/// Non-delimited identifiers compare case-insensitively; delimited (quoted)
/// identifiers compare exactly. The original spelling is always kept for
/// display.
#[derive(Debug, Clone)]
pub struct Identifier {
    /// The name as written, without quotes.
    pub value: String,
    /// Whether the name was written between double quotes.
    pub delimited: bool,
}

impl Identifier {
    /// Creates a non-delimited identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            delimited: false,
        }
    }

    /// Creates a delimited identifier.
    #[must_use]
    pub fn delimited(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            delimited: true,
        }
    }

    /// Returns the comparison key: the exact text when delimited, the
    /// lower-cased text otherwise.
    #[must_use]
    pub fn normalized(&self) -> Cow<'_, str> {
        if self.delimited || !self.value.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Borrowed(&self.value)
        } else {
            Cow::Owned(self.value.to_ascii_lowercase())
        }
    }

    /// Returns the identifier as double-quoted SQL.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("\"{}\"", self.value.replace('"', "\"\""))
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A dotted name such as `catalog.schema.table`. Always has at least one
/// part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    parts: Vec<Identifier>,
}

impl QualifiedName {
    /// Creates a qualified name from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyQualifiedName`] if `parts` is empty.
    pub fn new(parts: Vec<Identifier>) -> Result<Self, ConstructionError> {
        if parts.is_empty() {
            return Err(ConstructionError::EmptyQualifiedName);
        }
        Ok(Self { parts })
    }

    /// Creates a one-part name.
    #[must_use]
    pub fn single(ident: impl Into<Identifier>) -> Self {
        Self {
            parts: vec![ident.into()],
        }
    }

    /// Splits `a.b.c` into non-delimited parts. Empty segments are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyQualifiedName`] if no segment is left.
    pub fn from_dotted(name: &str) -> Result<Self, ConstructionError> {
        Self::new(
            name.split('.')
                .filter(|s| !s.is_empty())
                .map(Identifier::new)
                .collect(),
        )
    }

    /// All parts, outermost first.
    #[must_use]
    pub fn parts(&self) -> &[Identifier] {
        &self.parts
    }

    /// The last part.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        // Non-empty by construction.
        &self.parts[self.parts.len() - 1]
    }

    /// Every part except the last.
    #[must_use]
    pub fn qualifier(&self) -> &[Identifier] {
        &self.parts[..self.parts.len() - 1]
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns a new name with `ident` appended.
    #[must_use]
    pub fn child(&self, ident: impl Into<Identifier>) -> Self {
        let mut parts = self.parts.clone();
        parts.push(ident.into());
        Self { parts }
    }

    /// Returns true when `suffix` equals the trailing parts of this name, so
    /// that `t` and `s.t` both match `c.s.t`.
    #[must_use]
    pub fn matches_suffix(&self, suffix: &[Identifier]) -> bool {
        !suffix.is_empty()
            && suffix.len() <= self.parts.len()
            && self.parts[self.parts.len() - suffix.len()..] == *suffix
    }

    /// Renders the name as dot-separated quoted identifiers.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.parts
            .iter()
            .map(Identifier::to_sql)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<Identifier> for QualifiedName {
    fn from(ident: Identifier) -> Self {
        Self::single(ident)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(Identifier::new("Foo"), Identifier::new("FOO"));
        assert_eq!(Identifier::new("foo"), Identifier::delimited("foo"));
        assert_ne!(Identifier::new("foo"), Identifier::delimited("FOO"));
        assert_ne!(Identifier::delimited("Foo"), Identifier::delimited("foo"));
    }

    #[test]
    fn test_hash_agrees_with_eq() {
        let mut set = HashSet::new();
        set.insert(Identifier::new("Col"));
        assert!(set.contains(&Identifier::new("COL")));
        assert!(set.contains(&Identifier::delimited("col")));
        assert!(!set.contains(&Identifier::delimited("Col")));
    }

    #[test]
    fn test_display_keeps_spelling() {
        assert_eq!(Identifier::new("MyCol").to_string(), "\"MyCol\"");
        assert_eq!(Identifier::delimited("a\"b").to_sql(), "\"a\"\"b\"");
    }

    #[test]
    fn test_qualified_name_parts() {
        let name = QualifiedName::from_dotted("cat.sch.tbl").unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.name(), &Identifier::new("tbl"));
        assert_eq!(name.qualifier().len(), 2);
        assert_eq!(name.to_sql(), "\"cat\".\"sch\".\"tbl\"");
    }

    #[test]
    fn test_empty_qualified_name_rejected() {
        assert_eq!(
            QualifiedName::new(vec![]),
            Err(ConstructionError::EmptyQualifiedName)
        );
        assert!(QualifiedName::from_dotted("..").is_err());
    }

    #[test]
    fn test_matches_suffix() {
        let name = QualifiedName::from_dotted("c.s.t").unwrap();
        assert!(name.matches_suffix(&[Identifier::new("T")]));
        assert!(name.matches_suffix(&[Identifier::new("s"), Identifier::new("t")]));
        assert!(!name.matches_suffix(&[Identifier::new("c")]));
        assert!(!name.matches_suffix(&[]));
    }
}
