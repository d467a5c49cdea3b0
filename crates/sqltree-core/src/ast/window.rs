//! Window specifications for `OVER` clauses and the `WINDOW` clause.

use super::query::OrderTerm;
use super::{Expr, Identifier};

/// `IGNORE NULLS` or `RESPECT NULLS` on a window function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullTreatment {
    Ignore,
    Respect,
}

impl NullTreatment {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "IGNORE NULLS",
            Self::Respect => "RESPECT NULLS",
        }
    }
}

/// Unit of a window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnits {
    Rows,
    Range,
    Groups,
}

impl FrameUnits {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rows => "ROWS",
            Self::Range => "RANGE",
            Self::Groups => "GROUPS",
        }
    }
}

/// One end of a window frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    /// `UNBOUNDED PRECEDING`
    UnboundedPreceding,
    /// `n PRECEDING`
    Preceding(Box<Expr>),
    /// `CURRENT ROW`
    CurrentRow,
    /// `n FOLLOWING`
    Following(Box<Expr>),
    /// `UNBOUNDED FOLLOWING`
    UnboundedFollowing,
}

/// A window frame: `ROWS BETWEEN start AND end` or `ROWS start`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    /// Frame unit.
    pub units: FrameUnits,
    /// Frame start.
    pub start: FrameBound,
    /// Frame end; `None` means the single-bound form.
    pub end: Option<FrameBound>,
}

/// The body of an `OVER (...)` or `WINDOW w AS (...)` clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    /// A named window this one refines.
    pub existing: Option<Identifier>,
    /// `PARTITION BY` expressions.
    pub partition_by: Vec<Expr>,
    /// `ORDER BY` terms.
    pub order_by: Vec<OrderTerm>,
    /// Frame clause.
    pub frame: Option<WindowFrame>,
}

impl WindowSpec {
    /// Returns true if nothing is specified (`OVER ()`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.existing.is_none()
            && self.partition_by.is_empty()
            && self.order_by.is_empty()
            && self.frame.is_none()
    }
}

/// The target of an `OVER` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Over {
    /// `OVER w`
    Named(Identifier),
    /// `OVER (...)`
    Spec(WindowSpec),
}

/// An entry of the `WINDOW` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedWindow {
    /// Window name.
    pub name: Identifier,
    /// Window definition.
    pub spec: WindowSpec,
}
