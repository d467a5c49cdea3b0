//! Expression typing against a schema scope.

use crate::ast::{
    BinaryOp, DataType, Expr, Identifier, Literal, QualifiedName, RowField, UnaryOp,
    MAX_DECIMAL_PRECISION,
};
use crate::error::{ResolutionError, Result};
use crate::schema::{common_supertype, MergeMode, Schema, SchemaField};

use super::functions::return_type;
use super::{resolve_query, ResolutionContext};

/// The columns an expression can refer to.
///
/// Lookups try the local schema first, then the outer one. Without a
/// [`ResolutionContext`] scalar subqueries type as `Unknown`.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    local: &'a Schema,
    outer: Option<&'a Schema>,
    context: Option<&'a ResolutionContext<'a>>,
}

/// A field found for a column reference, plus the trailing name parts that
/// dereference into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMatch<'a> {
    /// The matched field.
    pub field: &'a SchemaField,
    /// Name parts after the column, read as row field accesses.
    pub rest: &'a [Identifier],
}

impl<'a> Scope<'a> {
    /// A scope over a single schema.
    #[must_use]
    pub const fn new(local: &'a Schema) -> Self {
        Self {
            local,
            outer: None,
            context: None,
        }
    }

    /// Makes `outer` visible behind the local schema.
    #[must_use]
    pub const fn with_outer(mut self, outer: Option<&'a Schema>) -> Self {
        self.outer = outer;
        self
    }

    /// Lets subqueries resolve against `context`.
    #[must_use]
    pub const fn with_context(mut self, context: &'a ResolutionContext<'a>) -> Self {
        self.context = Some(context);
        self
    }

    /// Resolves a column reference.
    ///
    /// `a.b.c` is tried as column `c` of relation `a.b`, then as column `b`
    /// of `a` with field access `.c`, then as column `a` with `.b.c`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::AmbiguousColumn`] when the first schema
    /// that knows the name has more than one match.
    pub fn resolve_column(&self, name: &'a QualifiedName) -> Result<Option<ColumnMatch<'a>>> {
        let parts = name.parts();
        for split in (0..parts.len()).rev() {
            let (qualifier, tail) = parts.split_at(split);
            let Some((column, rest)) = tail.split_first() else {
                continue;
            };
            for schema in std::iter::once(self.local).chain(self.outer) {
                if let Some((_, field)) = schema.field_named(column, qualifier)? {
                    return Ok(Some(ColumnMatch { field, rest }));
                }
            }
        }
        Ok(None)
    }
}

/// Infers the type of `expr` in `scope`.
///
/// Unresolvable columns and unregistered functions are `Unknown`.
///
/// # Errors
///
/// Returns [`ResolutionError::AmbiguousColumn`] for an ambiguous column, and
/// [`ResolutionError::TypeMismatch`] when operands that must share a type
/// have no common supertype.
pub fn infer_type(expr: &Expr, scope: &Scope<'_>) -> Result<DataType> {
    let data_type = match expr {
        Expr::Literal(literal) => literal_type(literal),
        Expr::Column(name) => match scope.resolve_column(name)? {
            Some(found) => found
                .rest
                .iter()
                .fold(found.field.data_type.clone(), |ty, field| row_field(&ty, field)),
            None => DataType::Unknown,
        },
        Expr::Parameter(_) | Expr::Wildcard(_) | Expr::Lambda { .. } => DataType::Unknown,
        Expr::Binary { left, op, right } => {
            let left = infer_type(left, scope)?;
            let right = infer_type(right, scope)?;
            binary_type(*op, left, right)?
        }
        Expr::Unary { op, operand } => {
            let operand = infer_type(operand, scope)?;
            match op {
                UnaryOp::Not => DataType::Boolean,
                UnaryOp::Minus | UnaryOp::Plus => operand,
            }
        }
        Expr::IsNull { expr, .. } | Expr::InSubquery { expr, .. } => {
            infer_type(expr, scope)?;
            DataType::Boolean
        }
        Expr::IsDistinctFrom { left, right, .. } => {
            infer_type(left, scope)?;
            infer_type(right, scope)?;
            DataType::Boolean
        }
        Expr::Like { expr, pattern, .. } => {
            infer_type(expr, scope)?;
            infer_type(pattern, scope)?;
            DataType::Boolean
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            for operand in [expr, low, high] {
                infer_type(operand, scope)?;
            }
            DataType::Boolean
        }
        Expr::InList { expr, list, .. } => {
            infer_type(expr, scope)?;
            for item in list {
                infer_type(item, scope)?;
            }
            DataType::Boolean
        }
        Expr::Exists(_) => DataType::Boolean,
        Expr::Subquery(query) => match scope.context {
            Some(context) => {
                let visible = match scope.outer {
                    Some(outer) => scope.local.merge(outer, MergeMode::Append)?,
                    None => scope.local.clone(),
                };
                let schema = resolve_query(query, &context.with_outer(visible))?;
                match schema.fields.as_slice() {
                    [single] => single.data_type.clone(),
                    _ => schema.row_type(),
                }
            }
            None => DataType::Unknown,
        },
        Expr::Function(call) => {
            let args = call
                .args
                .iter()
                .map(|arg| infer_type(arg, scope))
                .collect::<Result<Vec<_>>>()?;
            return_type(&call.name.name().value, &args).unwrap_or(DataType::Unknown)
        }
        Expr::Cast { data_type, .. } => data_type.clone(),
        Expr::Case {
            operand,
            when_clauses,
            else_clause,
        } => {
            if let Some(operand) = operand {
                infer_type(operand, scope)?;
            }
            let mut result = DataType::Unknown;
            for (condition, value) in when_clauses {
                infer_type(condition, scope)?;
                result = supertype_or_mismatch("CASE", &result, &infer_type(value, scope)?)?;
            }
            if let Some(otherwise) = else_clause {
                result = supertype_or_mismatch("CASE", &result, &infer_type(otherwise, scope)?)?;
            }
            result
        }
        Expr::Array(items) => {
            let mut element = DataType::Unknown;
            for item in items {
                element = supertype_or_mismatch("ARRAY", &element, &infer_type(item, scope)?)?;
            }
            DataType::array(element)
        }
        Expr::Row(items) => DataType::Row(
            items
                .iter()
                .map(|item| infer_type(item, scope).map(RowField::anonymous))
                .collect::<Result<Vec<_>>>()?,
        ),
        Expr::Subscript { base, index } => {
            let index_type = infer_type(index, scope)?;
            match infer_type(base, scope)? {
                DataType::Array(element) => *element,
                DataType::Map(_, value) => *value,
                DataType::Row(fields) => match (&**index, index_type.is_integral()) {
                    (Expr::Literal(Literal::Integer(position)), true) => usize::try_from(*position)
                        .ok()
                        .and_then(|position| position.checked_sub(1))
                        .and_then(|position| fields.get(position))
                        .map_or(DataType::Unknown, |field| field.data_type.clone()),
                    _ => DataType::Unknown,
                },
                _ => DataType::Unknown,
            }
        }
        Expr::Dereference { base, field } => row_field(&infer_type(base, scope)?, field),
        Expr::Interval { from, .. } => {
            if from.is_year_month() {
                DataType::IntervalYearToMonth
            } else {
                DataType::IntervalDayToSecond
            }
        }
        Expr::TypedLiteral { type_name, value } => typed_literal_type(type_name, value),
    };
    Ok(data_type)
}

fn literal_type(literal: &Literal) -> DataType {
    match literal {
        Literal::Null => DataType::Unknown,
        Literal::Boolean(_) => DataType::Boolean,
        Literal::Integer(value) => {
            if i32::try_from(*value).is_ok() {
                DataType::Integer
            } else {
                DataType::Bigint
            }
        }
        Literal::Decimal(text) => decimal_from_text(text),
        Literal::Double(_) => DataType::Double,
        Literal::String(value) => DataType::Varchar(u32::try_from(value.chars().count()).ok()),
        Literal::Binary(_) => DataType::Varbinary,
    }
}

/// Derives `DECIMAL(p,s)` from the digits of an exact numeric literal.
fn decimal_from_text(text: &str) -> DataType {
    let digits = text.trim().trim_start_matches(['+', '-']);
    let (integral, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let integral = integral.trim_start_matches('0');
    let clamp = |count: usize| u8::try_from(count).unwrap_or(u8::MAX).min(MAX_DECIMAL_PRECISION);
    let scale = clamp(fraction.len());
    let precision = clamp(integral.len() + fraction.len()).max(1).max(scale);
    DataType::decimal(precision, scale)
}

fn row_field(data_type: &DataType, name: &Identifier) -> DataType {
    match data_type {
        DataType::Row(fields) => fields
            .iter()
            .find(|field| {
                field
                    .name
                    .as_ref()
                    .is_some_and(|field_name| Identifier::new(field_name.as_str()) == *name)
            })
            .map_or(DataType::Unknown, |field| field.data_type.clone()),
        _ => DataType::Unknown,
    }
}

fn binary_type(op: BinaryOp, left: DataType, right: DataType) -> Result<DataType> {
    if op.is_logical() || op.is_comparison() {
        return Ok(DataType::Boolean);
    }
    if op == BinaryOp::Concat {
        return match (&left, &right) {
            (DataType::Array(_), _) | (_, DataType::Array(_)) => {
                supertype_or_mismatch("||", &left, &right)
            }
            _ => Ok(DataType::Varchar(None)),
        };
    }
    match (op, &left, &right) {
        (BinaryOp::Sub, l, r) if l.is_temporal() && r.is_temporal() => {
            Ok(DataType::IntervalDayToSecond)
        }
        (BinaryOp::Add | BinaryOp::Sub, temporal, interval)
            if temporal.is_temporal() && interval.is_interval() =>
        {
            Ok(temporal.clone())
        }
        (BinaryOp::Add, interval, temporal) if temporal.is_temporal() && interval.is_interval() => {
            Ok(temporal.clone())
        }
        _ => supertype_or_mismatch(&format!("operator {}", op.as_str()), &left, &right),
    }
}

fn supertype_or_mismatch(context: &str, left: &DataType, right: &DataType) -> Result<DataType> {
    common_supertype(left, right).ok_or_else(|| ResolutionError::TypeMismatch {
        context: context.to_string(),
        left: left.clone(),
        right: right.clone(),
    })
}

fn typed_literal_type(type_name: &str, value: &str) -> DataType {
    match type_name {
        "DATE" => DataType::Date,
        "TIMESTAMP" => {
            let mut words = value.split_whitespace();
            let _date = words.next();
            let time = words.next().unwrap_or_default();
            let (precision, zone_suffix) = time_text(time);
            DataType::Timestamp {
                precision,
                with_time_zone: zone_suffix || words.next().is_some(),
            }
        }
        "TIME" => {
            let mut words = value.split_whitespace();
            let (precision, zone_suffix) = time_text(words.next().unwrap_or_default());
            DataType::Time {
                precision,
                with_time_zone: zone_suffix || words.next().is_some(),
            }
        }
        "DECIMAL" | "NUMERIC" => decimal_from_text(value),
        "JSON" => DataType::Json,
        "BOOLEAN" => DataType::Boolean,
        "TINYINT" => DataType::Tinyint,
        "SMALLINT" => DataType::Smallint,
        "INTEGER" | "INT" => DataType::Integer,
        "BIGINT" => DataType::Bigint,
        "REAL" => DataType::Real,
        "DOUBLE" => DataType::Double,
        "VARCHAR" => DataType::Varchar(u32::try_from(value.chars().count()).ok()),
        "CHAR" => DataType::Char(u32::try_from(value.chars().count()).unwrap_or(u32::MAX).max(1)),
        "VARBINARY" => DataType::Varbinary,
        _ => DataType::Unknown,
    }
}

/// Reads a time-of-day literal: fractional-second digits and whether an
/// offset (`+01:00`, `-05:00`, `Z`) follows it.
fn time_text(time: &str) -> (u8, bool) {
    let precision = time.split_once('.').map_or(0, |(_, fraction)| {
        fraction.chars().take_while(char::is_ascii_digit).count()
    });
    let with_zone = time.contains(['+', '-']) || time.ends_with(['Z', 'z']);
    (u8::try_from(precision).unwrap_or(u8::MAX).min(12), with_zone)
}
