//! Relation AST types: anything that can appear in a FROM clause.

use super::query::{Query, SetQuantifier};
use super::{Expr, Identifier, QualifiedName};
use crate::error::ConstructionError;
use crate::schema::Schema;

/// A base table reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// The table name.
    pub name: QualifiedName,
    /// A schema bound to the node ahead of resolution, used when the
    /// catalog does not know the table.
    pub schema: Option<Schema>,
}

/// `relation AS alias (columns)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedRelation {
    /// The aliased relation.
    pub relation: Box<Relation>,
    /// The alias.
    pub alias: Identifier,
    /// Optional column aliases.
    pub columns: Vec<Identifier>,
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the SQL representation of the join type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// How the rows of a join are matched.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinCriteria {
    /// `ON condition`
    On(Expr),
    /// `USING (a, b)`
    Using(Vec<Identifier>),
    /// `NATURAL`
    Natural,
    /// No criteria (cross joins).
    None,
}

/// A binary join.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Left input.
    pub left: Box<Relation>,
    /// Right input.
    pub right: Box<Relation>,
    /// Join type.
    pub join_type: JoinType,
    /// Join criteria.
    pub criteria: JoinCriteria,
}

impl Join {
    /// Creates a join, checking that the criteria fit the join type.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidJoinCriteria`] for a CROSS JOIN
    /// with criteria, or any other join without them.
    pub fn new(
        left: Relation,
        right: Relation,
        join_type: JoinType,
        criteria: JoinCriteria,
    ) -> Result<Self, ConstructionError> {
        match (join_type, &criteria) {
            (JoinType::Cross, JoinCriteria::None) => {}
            (JoinType::Cross, JoinCriteria::On(_)) => {
                return Err(ConstructionError::InvalidJoinCriteria {
                    join_type: JoinType::Cross.as_str(),
                    criteria: "ON",
                });
            }
            (JoinType::Cross, JoinCriteria::Using(_)) => {
                return Err(ConstructionError::InvalidJoinCriteria {
                    join_type: JoinType::Cross.as_str(),
                    criteria: "USING",
                });
            }
            (JoinType::Cross, JoinCriteria::Natural) => {
                return Err(ConstructionError::InvalidJoinCriteria {
                    join_type: JoinType::Cross.as_str(),
                    criteria: "NATURAL",
                });
            }
            (other, JoinCriteria::None) => {
                return Err(ConstructionError::InvalidJoinCriteria {
                    join_type: other.as_str(),
                    criteria: "no criteria",
                });
            }
            (_, JoinCriteria::Using(cols)) if cols.is_empty() => {
                return Err(ConstructionError::InvalidJoinCriteria {
                    join_type: join_type.as_str(),
                    criteria: "an empty USING list",
                });
            }
            _ => {}
        }
        Ok(Self {
            left: Box::new(left),
            right: Box::new(right),
            join_type,
            criteria,
        })
    }
}

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }

    /// INTERSECT binds tighter than UNION and EXCEPT.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Union | Self::Except => 1,
            Self::Intersect => 2,
        }
    }
}

/// `left op [ALL] right`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    /// The operator.
    pub operator: SetOperator,
    /// `DISTINCT` (default) or `ALL`.
    pub quantifier: SetQuantifier,
    /// Left input.
    pub left: Box<Query>,
    /// Right input.
    pub right: Box<Query>,
}

impl SetOperation {
    /// Creates a set operation with the default quantifier.
    #[must_use]
    pub fn new(operator: SetOperator, left: Query, right: Query) -> Self {
        Self {
            operator,
            quantifier: SetQuantifier::Distinct,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Switches to `ALL`.
    #[must_use]
    pub fn all(mut self) -> Self {
        self.quantifier = SetQuantifier::All;
        self
    }
}

/// `VALUES row, row, ...`. Each row is one expression; a multi-column row is
/// an [`Expr::Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesQuery {
    rows: Vec<Expr>,
}

impl ValuesQuery {
    /// Creates a VALUES list.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyValues`] if `rows` is empty.
    pub fn new(rows: Vec<Expr>) -> Result<Self, ConstructionError> {
        if rows.is_empty() {
            return Err(ConstructionError::EmptyValues);
        }
        Ok(Self { rows })
    }

    /// The rows.
    #[must_use]
    pub fn rows(&self) -> &[Expr] {
        &self.rows
    }
}

/// `UNNEST(a, b) [WITH ORDINALITY]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unnest {
    args: Vec<Expr>,
    /// Adds a trailing ordinal column.
    pub with_ordinality: bool,
}

impl Unnest {
    /// Creates an UNNEST.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyUnnest`] if `args` is empty.
    pub fn new(args: Vec<Expr>, with_ordinality: bool) -> Result<Self, ConstructionError> {
        if args.is_empty() {
            return Err(ConstructionError::EmptyUnnest);
        }
        Ok(Self {
            args,
            with_ordinality,
        })
    }

    /// The unnested expressions.
    #[must_use]
    pub fn args(&self) -> &[Expr] {
        &self.args
    }
}

/// `LATERAL (query)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lateral {
    /// The correlated subquery.
    pub query: Box<Query>,
}

/// Sampling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMethod {
    Bernoulli,
    System,
}

impl SampleMethod {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bernoulli => "BERNOULLI",
            Self::System => "SYSTEM",
        }
    }
}

/// `relation TABLESAMPLE method (percentage)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSample {
    /// The sampled relation.
    pub relation: Box<Relation>,
    /// Sampling method.
    pub method: SampleMethod,
    /// Sample percentage.
    pub percentage: Expr,
}

/// A relation: anything producing rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// A base table.
    Table(Table),
    /// An aliased relation.
    Aliased(AliasedRelation),
    /// A join.
    Join(Join),
    /// A set operation.
    SetOperation(SetOperation),
    /// A full query used as a relation.
    Query(Box<Query>),
    /// A VALUES list.
    Values(ValuesQuery),
    /// UNNEST.
    Unnest(Unnest),
    /// LATERAL.
    Lateral(Lateral),
    /// TABLESAMPLE.
    TableSample(TableSample),
}

impl Relation {
    /// A base table with no pre-bound schema.
    #[must_use]
    pub fn table(name: impl Into<QualifiedName>) -> Self {
        Self::Table(Table {
            name: name.into(),
            schema: None,
        })
    }

    /// A base table with a pre-bound schema.
    #[must_use]
    pub fn table_with_schema(name: impl Into<QualifiedName>, schema: Schema) -> Self {
        Self::Table(Table {
            name: name.into(),
            schema: Some(schema),
        })
    }

    /// A query used as a relation.
    #[must_use]
    pub fn query(query: Query) -> Self {
        Self::Query(Box::new(query))
    }

    /// `LATERAL (query)`.
    #[must_use]
    pub fn lateral(query: Query) -> Self {
        Self::Lateral(Lateral {
            query: Box::new(query),
        })
    }

    /// Aliases this relation.
    #[must_use]
    pub fn alias(self, alias: impl Into<Identifier>) -> Self {
        self.alias_with_columns(alias, vec![])
    }

    /// Aliases this relation and renames its columns.
    #[must_use]
    pub fn alias_with_columns(self, alias: impl Into<Identifier>, columns: Vec<Identifier>) -> Self {
        Self::Aliased(AliasedRelation {
            relation: Box::new(self),
            alias: alias.into(),
            columns,
        })
    }

    /// Joins `right` to this relation.
    ///
    /// # Errors
    ///
    /// See [`Join::new`].
    pub fn join(
        self,
        right: Self,
        join_type: JoinType,
        criteria: JoinCriteria,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::Join(Join::new(self, right, join_type, criteria)?))
    }

    /// `self CROSS JOIN right`.
    #[must_use]
    pub fn cross_join(self, right: Self) -> Self {
        Self::Join(Join {
            left: Box::new(self),
            right: Box::new(right),
            join_type: JoinType::Cross,
            criteria: JoinCriteria::None,
        })
    }

    /// Samples this relation.
    #[must_use]
    pub fn sample(self, method: SampleMethod, percentage: Expr) -> Self {
        Self::TableSample(TableSample {
            relation: Box::new(self),
            method,
            percentage,
        })
    }
}
