//! Query AST types: SELECT, WITH, GROUP BY, ORDER BY and LIMIT.

use super::relation::{Relation, SetOperation, ValuesQuery};
use super::window::NamedWindow;
use super::{Expr, Identifier, QualifiedName};
use crate::error::ConstructionError;

/// `DISTINCT` or `ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetQuantifier {
    #[default]
    Distinct,
    All,
}

impl SetQuantifier {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending (default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// NULL placement in an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLS FIRST.
    First,
    /// NULLS LAST.
    Last,
}

impl NullOrdering {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    /// The expression to sort by.
    pub expr: Expr,
    /// Sort direction.
    pub direction: OrderDirection,
    /// NULL placement, if stated.
    pub nulls: Option<NullOrdering>,
}

impl OrderTerm {
    /// Ascending term.
    #[must_use]
    pub const fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
            nulls: None,
        }
    }

    /// Descending term.
    #[must_use]
    pub const fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
            nulls: None,
        }
    }

    /// Sets the NULL placement.
    #[must_use]
    pub fn nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = Some(nulls);
        self
    }
}

/// LIMIT clause value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `LIMIT n`
    Count(u64),
    /// `LIMIT ALL`
    All,
}

/// A common table expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    /// The binding name.
    pub name: Identifier,
    /// Optional column names.
    pub columns: Vec<Identifier>,
    /// The bound query.
    pub query: Box<Query>,
}

impl Cte {
    /// Creates a CTE without a column list.
    #[must_use]
    pub fn new(name: impl Into<Identifier>, query: Query) -> Self {
        Self {
            name: name.into(),
            columns: vec![],
            query: Box::new(query),
        }
    }
}

/// WITH clause.
#[derive(Debug, Clone, PartialEq)]
pub struct With {
    /// `WITH RECURSIVE`.
    pub recursive: bool,
    /// The bindings in order.
    pub ctes: Vec<Cte>,
}

/// A projection item.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// An expression with an optional alias.
    Expr {
        /// The projected expression.
        expr: Expr,
        /// Output name.
        alias: Option<Identifier>,
    },
    /// `*` or `t.*`, optionally `t.* AS (a, b)`.
    Wildcard {
        /// Relation qualifier.
        qualifier: Option<QualifiedName>,
        /// Column aliases for the expanded fields.
        aliases: Vec<Identifier>,
    },
}

impl SelectItem {
    /// An unaliased expression.
    #[must_use]
    pub const fn expr(expr: Expr) -> Self {
        Self::Expr { expr, alias: None }
    }

    /// An aliased expression.
    #[must_use]
    pub fn aliased(expr: Expr, alias: impl Into<Identifier>) -> Self {
        Self::Expr {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// `*`.
    #[must_use]
    pub const fn wildcard() -> Self {
        Self::Wildcard {
            qualifier: None,
            aliases: vec![],
        }
    }

    /// `t.*`.
    #[must_use]
    pub fn qualified_wildcard(qualifier: impl Into<QualifiedName>) -> Self {
        Self::Wildcard {
            qualifier: Some(qualifier.into()),
            aliases: vec![],
        }
    }
}

/// One element of a GROUP BY clause.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupingElement {
    /// A plain grouping expression.
    Expr(Expr),
    /// `ROLLUP (a, b)`
    Rollup(Vec<Expr>),
    /// `CUBE (a, b)`
    Cube(Vec<Expr>),
    /// `GROUPING SETS ((a, b), c, ())`
    GroupingSets(Vec<Vec<Expr>>),
}

impl GroupingElement {
    /// Creates a ROLLUP element.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyGroupingElement`] if `exprs` is empty.
    pub fn rollup(exprs: Vec<Expr>) -> Result<Self, ConstructionError> {
        if exprs.is_empty() {
            return Err(ConstructionError::EmptyGroupingElement("ROLLUP"));
        }
        Ok(Self::Rollup(exprs))
    }

    /// Creates a CUBE element.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyGroupingElement`] if `exprs` is empty.
    pub fn cube(exprs: Vec<Expr>) -> Result<Self, ConstructionError> {
        if exprs.is_empty() {
            return Err(ConstructionError::EmptyGroupingElement("CUBE"));
        }
        Ok(Self::Cube(exprs))
    }

    /// Creates a GROUPING SETS element.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyGroupingElement`] if `sets` is empty.
    pub fn grouping_sets(sets: Vec<Vec<Expr>>) -> Result<Self, ConstructionError> {
        if sets.is_empty() {
            return Err(ConstructionError::EmptyGroupingElement("GROUPING SETS"));
        }
        Ok(Self::GroupingSets(sets))
    }
}

/// GROUP BY clause.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    /// `GROUP BY DISTINCT` / `GROUP BY ALL`.
    pub quantifier: Option<SetQuantifier>,
    /// The grouping elements.
    pub elements: Vec<GroupingElement>,
}

/// A SELECT block.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// `SELECT DISTINCT` / `SELECT ALL`.
    pub quantifier: Option<SetQuantifier>,
    /// Projection items; never empty.
    pub items: Vec<SelectItem>,
    /// FROM list.
    pub from: Vec<Relation>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY clause.
    pub group_by: Option<GroupBy>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// WINDOW clause.
    pub windows: Vec<NamedWindow>,
}

impl Select {
    /// Creates a SELECT with only a projection.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyProjection`] if `items` is empty.
    pub fn new(items: Vec<SelectItem>) -> Result<Self, ConstructionError> {
        if items.is_empty() {
            return Err(ConstructionError::EmptyProjection);
        }
        Ok(Self {
            quantifier: None,
            items,
            from: vec![],
            where_clause: None,
            group_by: None,
            having: None,
            windows: vec![],
        })
    }
}

/// What a query evaluates before ordering and limiting.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryBody {
    /// A SELECT block.
    Select(Box<Select>),
    /// `TABLE name`.
    Table(QualifiedName),
    /// `VALUES ...`.
    Values(ValuesQuery),
    /// `a UNION b` and friends.
    SetOperation(SetOperation),
    /// A parenthesized query used as a body.
    Nested(Box<Query>),
}

/// A full query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// WITH clause.
    pub with: Option<With>,
    /// The body.
    pub body: QueryBody,
    /// ORDER BY clause.
    pub order_by: Vec<OrderTerm>,
    /// OFFSET clause.
    pub offset: Option<u64>,
    /// LIMIT clause.
    pub limit: Option<Limit>,
}

impl Query {
    /// Wraps a body with no WITH, ordering or limits.
    #[must_use]
    pub const fn new(body: QueryBody) -> Self {
        Self {
            with: None,
            body,
            order_by: vec![],
            offset: None,
            limit: None,
        }
    }

    /// Wraps a SELECT block.
    #[must_use]
    pub fn select(select: Select) -> Self {
        Self::new(QueryBody::Select(Box::new(select)))
    }

    /// `TABLE name`.
    #[must_use]
    pub const fn table(name: QualifiedName) -> Self {
        Self::new(QueryBody::Table(name))
    }

    /// Returns true if WITH, ORDER BY, OFFSET or LIMIT is present.
    #[must_use]
    pub fn has_modifiers(&self) -> bool {
        self.with.is_some()
            || !self.order_by.is_empty()
            || self.offset.is_some()
            || self.limit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_projection_rejected() {
        assert_eq!(Select::new(vec![]), Err(ConstructionError::EmptyProjection));
        assert!(Select::new(vec![SelectItem::wildcard()]).is_ok());
    }

    #[test]
    fn test_grouping_elements_validated() {
        assert_eq!(
            GroupingElement::rollup(vec![]),
            Err(ConstructionError::EmptyGroupingElement("ROLLUP"))
        );
        assert!(GroupingElement::cube(vec![Expr::column("a")]).is_ok());
        assert!(GroupingElement::grouping_sets(vec![vec![]]).is_ok());
    }

    #[test]
    fn test_query_modifiers() {
        let mut query = Query::table(QualifiedName::single("t"));
        assert!(!query.has_modifiers());
        query.limit = Some(Limit::Count(1));
        assert!(query.has_modifiers());
    }
}
