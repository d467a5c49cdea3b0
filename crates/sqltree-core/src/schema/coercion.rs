//! Implicit coercion between data types.

use crate::ast::{DataType, RowField, MAX_DECIMAL_PRECISION};

/// Returns the narrowest type both `left` and `right` can be implicitly
/// coerced to, or `None` if they are incompatible.
///
/// ```rust
/// use sqltree_core::ast::DataType;
/// use sqltree_core::schema::common_supertype;
///
/// assert_eq!(
///     common_supertype(&DataType::Integer, &DataType::decimal(5, 2)),
///     Some(DataType::decimal(12, 2))
/// );
/// assert_eq!(common_supertype(&DataType::Boolean, &DataType::Date), None);
/// ```
#[must_use]
pub fn common_supertype(left: &DataType, right: &DataType) -> Option<DataType> {
    if left == right {
        return Some(left.clone());
    }
    match (left, right) {
        (DataType::Unknown, other) | (other, DataType::Unknown) => Some(other.clone()),
        _ => directed_supertype(left, right).or_else(|| directed_supertype(right, left)),
    }
}

/// Rules written for one operand order; [`common_supertype`] tries both.
fn directed_supertype(left: &DataType, right: &DataType) -> Option<DataType> {
    match (left, right) {
        (l, r) if l.is_integral() && r.is_integral() => {
            let wider = if l.integral_digits() >= r.integral_digits() {
                l
            } else {
                r
            };
            Some(wider.clone())
        }
        (l, DataType::Decimal { precision, scale }) if l.is_integral() => {
            let digits = l.integral_digits()?;
            Some(decimal_supertype((digits, 0), (*precision, *scale)))
        }
        (
            DataType::Decimal {
                precision: p1,
                scale: s1,
            },
            DataType::Decimal {
                precision: p2,
                scale: s2,
            },
        ) => Some(decimal_supertype((*p1, *s1), (*p2, *s2))),
        (DataType::Double, r) if r.is_numeric() => Some(DataType::Double),
        (DataType::Real, r) if r.is_integral() || matches!(r, DataType::Decimal { .. }) => {
            Some(DataType::Real)
        }
        (DataType::Varchar(l), DataType::Varchar(r)) => {
            Some(DataType::Varchar(l.zip(*r).map(|(l, r)| l.max(r))))
        }
        (DataType::Char(l), DataType::Char(r)) => Some(DataType::Char(*l.max(r))),
        (DataType::Char(l), DataType::Varchar(Some(r))) => Some(DataType::Char(*l.max(r))),
        (DataType::Char(_), DataType::Varchar(None)) => Some(DataType::Varchar(None)),
        (
            DataType::Timestamp {
                precision: p1,
                with_time_zone: z1,
            },
            DataType::Timestamp {
                precision: p2,
                with_time_zone: z2,
            },
        ) => Some(DataType::Timestamp {
            precision: *p1.max(p2),
            with_time_zone: *z1 || *z2,
        }),
        (timestamp @ DataType::Timestamp { .. }, DataType::Date) => Some(timestamp.clone()),
        (
            DataType::Time {
                precision: p1,
                with_time_zone: z1,
            },
            DataType::Time {
                precision: p2,
                with_time_zone: z2,
            },
        ) => Some(DataType::Time {
            precision: *p1.max(p2),
            with_time_zone: *z1 || *z2,
        }),
        (DataType::Array(l), DataType::Array(r)) => {
            common_supertype(l, r).map(DataType::array)
        }
        (DataType::Map(lk, lv), DataType::Map(rk, rv)) => Some(DataType::map(
            common_supertype(lk, rk)?,
            common_supertype(lv, rv)?,
        )),
        (DataType::Row(l), DataType::Row(r)) if l.len() == r.len() => l
            .iter()
            .zip(r)
            .map(|(lf, rf)| {
                let data_type = common_supertype(&lf.data_type, &rf.data_type)?;
                let name = if lf.name == rf.name {
                    lf.name.clone()
                } else {
                    None
                };
                Some(RowField { name, data_type })
            })
            .collect::<Option<Vec<_>>>()
            .map(DataType::Row),
        _ => None,
    }
}

fn decimal_supertype((p1, s1): (u8, u8), (p2, s2): (u8, u8)) -> DataType {
    let scale = s1.max(s2);
    let integral = (p1 - s1.min(p1)).max(p2 - s2.min(p2));
    let precision = integral.saturating_add(scale).min(MAX_DECIMAL_PRECISION);
    DataType::decimal(precision, scale)
}
