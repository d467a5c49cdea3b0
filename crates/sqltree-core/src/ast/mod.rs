//! Object model for SQL query trees.
//!
//! Nodes own their children and never store parentheses; grouping is derived
//! from [`Precedence`] when a tree is rendered.

mod expression;
mod ident;
mod precedence;
mod query;
mod relation;
mod types;
mod window;

pub use expression::{BinaryOp, Expr, FunctionCall, IntervalField, Literal, UnaryOp};
pub use ident::{Identifier, QualifiedName};
pub use precedence::{binary_operand_needs_parens, needs_parens, Associativity, Precedence, Side};
pub use query::{
    Cte, GroupBy, GroupingElement, Limit, NullOrdering, OrderDirection, OrderTerm, Query,
    QueryBody, Select, SelectItem, SetQuantifier, With,
};
pub use relation::{
    AliasedRelation, Join, JoinCriteria, JoinType, Lateral, Relation, SampleMethod, SetOperation,
    SetOperator, Table, TableSample, Unnest, ValuesQuery,
};
pub use types::{
    DataType, RowField, DEFAULT_DECIMAL_PRECISION, DEFAULT_TIME_PRECISION, MAX_CHAR_LENGTH,
    MAX_DECIMAL_PRECISION,
};
pub use window::{FrameBound, FrameUnits, NamedWindow, NullTreatment, Over, WindowFrame, WindowSpec};
