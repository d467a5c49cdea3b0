//! Error types for tree construction and schema resolution.

use crate::ast::{DataType, Identifier, QualifiedName};

/// Errors raised while building a tree node that would violate a structural
/// invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// A qualified name needs at least one part.
    #[error("Qualified name must have at least one part")]
    EmptyQualifiedName,

    /// `IN ()` with nothing to compare against.
    #[error("IN list must contain at least one value")]
    EmptyInList,

    /// A CASE expression without any WHEN branch.
    #[error("CASE expression must have at least one WHEN branch")]
    EmptyCase,

    /// A lambda without parameters.
    #[error("Lambda expression must declare at least one parameter")]
    EmptyLambdaParams,

    /// A lambda declaring the same parameter twice.
    #[error("Lambda parameter '{0}' is declared more than once")]
    DuplicateLambdaParam(Identifier),

    /// A SELECT without projection items.
    #[error("SELECT must project at least one item")]
    EmptyProjection,

    /// A VALUES relation without rows.
    #[error("VALUES must contain at least one row")]
    EmptyValues,

    /// An UNNEST without arguments.
    #[error("UNNEST requires at least one argument")]
    EmptyUnnest,

    /// An empty ROLLUP, CUBE or GROUPING SETS element.
    #[error("{0} must contain at least one grouping")]
    EmptyGroupingElement(&'static str),

    /// Join criteria that do not fit the join type.
    #[error("{join_type} cannot be combined with {criteria}")]
    InvalidJoinCriteria {
        /// The join type keyword.
        join_type: &'static str,
        /// A description of the offending criteria.
        criteria: &'static str,
    },

    /// An interval qualifier whose end field is coarser than its start.
    #[error("Invalid interval range {from} TO {to}")]
    InvalidIntervalRange {
        /// The leading field.
        from: &'static str,
        /// The trailing field.
        to: &'static str,
    },
}

/// Errors raised by schema resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// A table reference that is neither a CTE, pre-bound, nor in the catalog.
    #[error("Unknown relation: {0}")]
    UnknownRelation(QualifiedName),

    /// Two relations in the same scope share an identity.
    #[error("Duplicate relation alias: {0}")]
    DuplicateRelationAlias(QualifiedName),

    /// A column alias list whose length differs from the field count.
    #[error("Relation {relation} has {actual} columns but {expected} aliases were given")]
    ArityMismatch {
        /// The alias being applied.
        relation: Identifier,
        /// Number of aliases supplied.
        expected: usize,
        /// Number of fields the relation produces.
        actual: usize,
    },

    /// Set operation inputs with different column counts.
    #[error("Set operation inputs have {left} and {right} columns")]
    ColumnCountMismatch {
        /// Column count of the left input.
        left: usize,
        /// Column count of the right input.
        right: usize,
    },

    /// VALUES rows of different widths.
    #[error("VALUES row {row} has {actual} columns, expected {expected}")]
    InconsistentRowArity {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },

    /// Two types that must agree have no common supertype.
    #[error("Type mismatch for {context}: {left} vs {right}")]
    TypeMismatch {
        /// What was being compared, e.g. a join column.
        context: String,
        /// Type on the left.
        left: DataType,
        /// Type on the right.
        right: DataType,
    },

    /// Set operation column types have no common supertype.
    #[error("Set operation column {position} has incompatible types {left} and {right}")]
    IncompatibleSetOperationTypes {
        /// Zero-based column position.
        position: usize,
        /// Type from the left input.
        left: DataType,
        /// Type from the right input.
        right: DataType,
    },

    /// A named column that is missing from a relation.
    #[error("Unknown column: {0}")]
    UnknownColumn(Identifier),

    /// A column reference matching more than one field.
    #[error("Ambiguous column: {0}")]
    AmbiguousColumn(Identifier),

    /// A strict merge that would repeat an existing field.
    #[error("Duplicate field: {0}")]
    DuplicateField(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be decoded.
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The document decoded but describes an invalid object.
    #[error("Invalid catalog entry: {0}")]
    Construction(#[from] ConstructionError),
}

/// Result type for schema resolution.
pub type Result<T> = std::result::Result<T, ResolutionError>;
