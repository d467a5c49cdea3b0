//! Expression AST types.

use std::collections::HashSet;

use super::query::{OrderTerm, Query, SetQuantifier};
use super::window::{NullTreatment, Over};
use super::{DataType, Identifier, QualifiedName};
use crate::error::ConstructionError;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// NULL literal.
    Null,
    /// Boolean literal.
    Boolean(bool),
    /// Integer literal.
    Integer(i64),
    /// Exact numeric literal, kept as written (e.g. `1.50`).
    Decimal(String),
    /// Approximate numeric literal (e.g. `1.5E0`).
    Double(f64),
    /// String literal.
    String(String),
    /// Binary literal (e.g. `X'0AFF'`).
    Binary(Vec<u8>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // String
    Concat,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Concat => "||",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Returns true for `AND` and `OR`.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns true for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical NOT
    Not,
    /// Negation (-)
    Minus,
    /// Identity (+)
    Plus,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Minus => "-",
            Self::Plus => "+",
        }
    }
}

/// Fields usable in an interval qualifier, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntervalField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl IntervalField {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
        }
    }

    /// Returns true for `YEAR` and `MONTH`.
    #[must_use]
    pub const fn is_year_month(&self) -> bool {
        matches!(self, Self::Year | Self::Month)
    }
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name.
    pub name: QualifiedName,
    /// `DISTINCT` or `ALL` inside the argument list.
    pub quantifier: Option<SetQuantifier>,
    /// The arguments.
    pub args: Vec<Expr>,
    /// `ORDER BY` inside the argument list (ordered aggregates).
    pub order_by: Vec<OrderTerm>,
    /// `FILTER (WHERE ...)`.
    pub filter: Option<Box<Expr>>,
    /// `IGNORE NULLS` / `RESPECT NULLS`.
    pub null_treatment: Option<NullTreatment>,
    /// `OVER` clause.
    pub over: Option<Over>,
}

impl FunctionCall {
    /// Creates a plain call.
    #[must_use]
    pub fn new(name: impl Into<QualifiedName>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            quantifier: None,
            args,
            order_by: vec![],
            filter: None,
            null_treatment: None,
            over: None,
        }
    }

    /// Sets the `OVER` clause.
    #[must_use]
    pub fn over(mut self, over: Over) -> Self {
        self.over = Some(over);
        self
    }

    /// Sets the `FILTER` clause.
    #[must_use]
    pub fn filter(mut self, condition: Expr) -> Self {
        self.filter = Some(Box::new(condition));
        self
    }

    /// Marks the call as `DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.quantifier = Some(SetQuantifier::Distinct);
        self
    }
}

/// An SQL expression.
///
/// Parentheses are not represented; the renderer derives them from
/// [`Expr::precedence`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A column reference, optionally qualified (`t.c`, `s.t.c`).
    Column(QualifiedName),

    /// A positional parameter placeholder (`?`), 1-based.
    Parameter(usize),

    /// `*` or `t.*` as a function argument.
    Wildcard(Option<QualifiedName>),

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// IS DISTINCT FROM expression.
    IsDistinctFrom {
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Whether this is IS NOT DISTINCT FROM.
        negated: bool,
    },

    /// LIKE expression.
    Like {
        /// The expression to match.
        expr: Box<Expr>,
        /// The pattern.
        pattern: Box<Expr>,
        /// Optional escape character.
        escape: Option<Box<Expr>>,
        /// Whether this is NOT LIKE.
        negated: bool,
    },

    /// BETWEEN expression.
    Between {
        /// The expression to check.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },

    /// IN with a value list.
    InList {
        /// The expression to check.
        expr: Box<Expr>,
        /// The candidate values.
        list: Vec<Expr>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// IN with a subquery.
    InSubquery {
        /// The expression to check.
        expr: Box<Expr>,
        /// The subquery.
        query: Box<Query>,
        /// Whether this is NOT IN.
        negated: bool,
    },

    /// EXISTS (subquery).
    Exists(Box<Query>),

    /// A scalar subquery.
    Subquery(Box<Query>),

    /// A function call.
    Function(FunctionCall),

    /// CAST or TRY_CAST expression.
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        data_type: DataType,
        /// `TRY_CAST` when true.
        safe: bool,
    },

    /// CASE expression.
    Case {
        /// The operand (if any).
        operand: Option<Box<Expr>>,
        /// WHEN/THEN clauses.
        when_clauses: Vec<(Expr, Expr)>,
        /// ELSE clause.
        else_clause: Option<Box<Expr>>,
    },

    /// `ARRAY[...]` constructor.
    Array(Vec<Expr>),

    /// Row constructor.
    Row(Vec<Expr>),

    /// `base[index]`.
    Subscript {
        /// The array or map.
        base: Box<Expr>,
        /// The index or key.
        index: Box<Expr>,
    },

    /// `base.field` on a non-name base.
    Dereference {
        /// The row value.
        base: Box<Expr>,
        /// The field name.
        field: Identifier,
    },

    /// `x -> body`.
    Lambda {
        /// Parameter names.
        params: Vec<Identifier>,
        /// Lambda body.
        body: Box<Expr>,
    },

    /// Interval literal.
    Interval {
        /// Quoted value text, e.g. `3` or `1-2`.
        value: String,
        /// A leading minus sign.
        negative: bool,
        /// Leading field.
        from: IntervalField,
        /// Optional trailing field.
        to: Option<IntervalField>,
    },

    /// A literal introduced by its type name, e.g. `DATE '2021-01-01'`.
    TypedLiteral {
        /// The type name as written, upper-cased.
        type_name: String,
        /// The quoted value.
        value: String,
    },
}

impl Expr {
    /// Creates a new column reference.
    #[must_use]
    pub fn column(name: impl Into<Identifier>) -> Self {
        Self::Column(QualifiedName::single(name))
    }

    /// Creates a new qualified column reference.
    #[must_use]
    pub fn qualified_column(table: impl Into<Identifier>, name: impl Into<Identifier>) -> Self {
        Self::Column(QualifiedName::single(table).child(name))
    }

    /// Creates a new integer literal.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Creates a new exact numeric literal from its text.
    #[must_use]
    pub fn decimal(text: impl Into<String>) -> Self {
        Self::Literal(Literal::Decimal(text.into()))
    }

    /// Creates a new double literal.
    #[must_use]
    pub const fn double(value: f64) -> Self {
        Self::Literal(Literal::Double(value))
    }

    /// Creates a new string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    /// Creates a new boolean literal.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    /// Creates a NULL literal.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    /// Creates a function call.
    #[must_use]
    pub fn function(name: impl Into<Identifier>, args: Vec<Self>) -> Self {
        Self::Function(FunctionCall::new(QualifiedName::single(name), args))
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Creates an addition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, right: Self) -> Self {
        self.binary(BinaryOp::Add, right)
    }

    /// Creates a subtraction.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, right: Self) -> Self {
        self.binary(BinaryOp::Sub, right)
    }

    /// Creates a multiplication.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, right: Self) -> Self {
        self.binary(BinaryOp::Mul, right)
    }

    /// Creates a division.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, right: Self) -> Self {
        self.binary(BinaryOp::Div, right)
    }

    /// Creates a modulo expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn rem(self, right: Self) -> Self {
        self.binary(BinaryOp::Mod, right)
    }

    /// Creates a `||` concatenation.
    #[must_use]
    pub fn concat(self, right: Self) -> Self {
        self.binary(BinaryOp::Concat, right)
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Creates an inequality expression.
    #[must_use]
    pub fn not_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, right: Self) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::LtEq, right)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, right: Self) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, right: Self) -> Self {
        self.binary(BinaryOp::GtEq, right)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    /// Creates a NOT expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Creates a negation.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Self::Unary {
            op: UnaryOp::Minus,
            operand: Box::new(self),
        }
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Creates an IS DISTINCT FROM expression.
    #[must_use]
    pub fn is_distinct_from(self, right: Self) -> Self {
        Self::IsDistinctFrom {
            left: Box::new(self),
            right: Box::new(right),
            negated: false,
        }
    }

    /// Creates a LIKE expression.
    #[must_use]
    pub fn like(self, pattern: Self) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: Box::new(pattern),
            escape: None,
            negated: false,
        }
    }

    /// Creates a NOT LIKE expression.
    #[must_use]
    pub fn not_like(self, pattern: Self) -> Self {
        Self::Like {
            expr: Box::new(self),
            pattern: Box::new(pattern),
            escape: None,
            negated: true,
        }
    }

    /// Creates a BETWEEN expression.
    #[must_use]
    pub fn between(self, low: Self, high: Self) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    /// Creates a NOT BETWEEN expression.
    #[must_use]
    pub fn not_between(self, low: Self, high: Self) -> Self {
        Self::Between {
            expr: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: true,
        }
    }

    /// Creates an IN expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyInList`] if `list` is empty.
    pub fn in_list(self, list: Vec<Self>) -> Result<Self, ConstructionError> {
        self.in_list_impl(list, false)
    }

    /// Creates a NOT IN expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyInList`] if `list` is empty.
    pub fn not_in_list(self, list: Vec<Self>) -> Result<Self, ConstructionError> {
        self.in_list_impl(list, true)
    }

    fn in_list_impl(self, list: Vec<Self>, negated: bool) -> Result<Self, ConstructionError> {
        if list.is_empty() {
            return Err(ConstructionError::EmptyInList);
        }
        Ok(Self::InList {
            expr: Box::new(self),
            list,
            negated,
        })
    }

    /// Creates an IN (subquery) expression.
    #[must_use]
    pub fn in_subquery(self, query: Query) -> Self {
        Self::InSubquery {
            expr: Box::new(self),
            query: Box::new(query),
            negated: false,
        }
    }

    /// Creates a CAST expression.
    #[must_use]
    pub fn cast(self, data_type: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            data_type,
            safe: false,
        }
    }

    /// Creates a TRY_CAST expression.
    #[must_use]
    pub fn try_cast(self, data_type: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            data_type,
            safe: true,
        }
    }

    /// Creates a subscript expression.
    #[must_use]
    pub fn subscript(self, index: Self) -> Self {
        Self::Subscript {
            base: Box::new(self),
            index: Box::new(index),
        }
    }

    /// Creates a row-field dereference.
    #[must_use]
    pub fn field(self, field: impl Into<Identifier>) -> Self {
        Self::Dereference {
            base: Box::new(self),
            field: field.into(),
        }
    }

    /// Creates a CASE expression.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyCase`] if there are no WHEN clauses.
    pub fn case(
        operand: Option<Self>,
        when_clauses: Vec<(Self, Self)>,
        else_clause: Option<Self>,
    ) -> Result<Self, ConstructionError> {
        if when_clauses.is_empty() {
            return Err(ConstructionError::EmptyCase);
        }
        Ok(Self::Case {
            operand: operand.map(Box::new),
            when_clauses,
            else_clause: else_clause.map(Box::new),
        })
    }

    /// Creates a lambda expression.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no parameters or a parameter repeats.
    pub fn lambda(params: Vec<Identifier>, body: Self) -> Result<Self, ConstructionError> {
        if params.is_empty() {
            return Err(ConstructionError::EmptyLambdaParams);
        }
        let mut seen = HashSet::new();
        for param in &params {
            if !seen.insert(param) {
                return Err(ConstructionError::DuplicateLambdaParam(param.clone()));
            }
        }
        Ok(Self::Lambda {
            params,
            body: Box::new(body),
        })
    }

    /// Creates an interval literal.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidIntervalRange`] if `to` is not a
    /// finer field than `from`, or mixes year-month with day-time fields.
    pub fn interval(
        value: impl Into<String>,
        negative: bool,
        from: IntervalField,
        to: Option<IntervalField>,
    ) -> Result<Self, ConstructionError> {
        if let Some(to) = to {
            if to <= from || to.is_year_month() != from.is_year_month() {
                return Err(ConstructionError::InvalidIntervalRange {
                    from: from.as_str(),
                    to: to.as_str(),
                });
            }
        }
        Ok(Self::Interval {
            value: value.into(),
            negative,
            from,
            to,
        })
    }

    /// Creates a typed literal such as `DATE '2021-01-01'`.
    #[must_use]
    pub fn typed_literal(type_name: &str, value: impl Into<String>) -> Self {
        Self::TypedLiteral {
            type_name: type_name.to_ascii_uppercase(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_builders() {
        let col = Expr::column("name");
        assert!(matches!(&col, Expr::Column(name) if name.name() == &Identifier::new("name")));

        let lit = Expr::integer(42);
        assert!(matches!(lit, Expr::Literal(Literal::Integer(42))));
    }

    #[test]
    fn test_expr_chaining() {
        let expr = Expr::column("age")
            .gt(Expr::integer(18))
            .and(Expr::column("status").eq(Expr::string("active")));

        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_in_list_rejected() {
        assert_eq!(
            Expr::column("a").in_list(vec![]),
            Err(ConstructionError::EmptyInList)
        );
        assert!(Expr::column("a").in_list(vec![Expr::integer(1)]).is_ok());
    }

    #[test]
    fn test_case_requires_branch() {
        assert_eq!(
            Expr::case(None, vec![], Some(Expr::null())),
            Err(ConstructionError::EmptyCase)
        );
    }

    #[test]
    fn test_lambda_params_validated() {
        assert_eq!(
            Expr::lambda(vec![], Expr::integer(1)),
            Err(ConstructionError::EmptyLambdaParams)
        );
        let dup = Expr::lambda(
            vec![Identifier::new("x"), Identifier::new("X")],
            Expr::column("x"),
        );
        assert!(matches!(dup, Err(ConstructionError::DuplicateLambdaParam(_))));
    }

    #[test]
    fn test_interval_range_validated() {
        assert!(Expr::interval("1-2", false, IntervalField::Year, Some(IntervalField::Month)).is_ok());
        assert!(Expr::interval("1", false, IntervalField::Day, Some(IntervalField::Year)).is_err());
        assert!(Expr::interval("1", false, IntervalField::Month, Some(IntervalField::Day)).is_err());
    }

    #[test]
    fn test_typed_literal_upper_cases_name() {
        assert_eq!(
            Expr::typed_literal("date", "2021-01-01"),
            Expr::TypedLiteral {
                type_name: String::from("DATE"),
                value: String::from("2021-01-01"),
            }
        );
    }
}
