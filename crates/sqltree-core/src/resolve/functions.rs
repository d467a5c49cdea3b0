//! Return types of well-known functions.

use crate::ast::{DataType, MAX_DECIMAL_PRECISION};
use crate::schema::common_supertype;

/// Returns the result type of calling `name` with arguments of types `args`,
/// or `None` for functions outside the registry.
///
/// Names are matched case-insensitively.
#[must_use]
pub fn return_type(name: &str, args: &[DataType]) -> Option<DataType> {
    let first = || args.first().cloned().unwrap_or(DataType::Unknown);
    let name = name.to_ascii_lowercase();
    let data_type = match name.as_str() {
        "count" | "count_if" | "approx_distinct" | "length" | "strpos" | "date_diff"
        | "row_number" | "rank" | "dense_rank" | "ntile" | "cardinality" => DataType::Bigint,

        "sum" => match first() {
            ty if ty.is_integral() => DataType::Bigint,
            DataType::Decimal { scale, .. } => DataType::decimal(MAX_DECIMAL_PRECISION, scale),
            other => other,
        },
        "avg" => match first() {
            ty @ (DataType::Decimal { .. } | DataType::Unknown) => ty,
            _ => DataType::Double,
        },

        "min" | "max" | "arbitrary" | "any_value" | "lower" | "upper" | "trim" | "ltrim"
        | "rtrim" | "reverse" | "substr" | "substring" | "abs" | "ceil" | "ceiling"
        | "floor" | "round" | "lag" | "lead" | "first_value" | "last_value" | "nth_value" => {
            first()
        }
        "date_trunc" => args.get(1).cloned().unwrap_or(DataType::Unknown),

        "array_agg" => DataType::array(first()),
        "bool_and" | "bool_or" | "every" => DataType::Boolean,

        "coalesce" | "greatest" | "least" | "nullif" => fold_supertype(args),
        // The condition is not a value argument.
        "if" => fold_supertype(args.get(1..).unwrap_or_default()),

        "concat" => DataType::Varchar(None),
        "sqrt" | "ln" | "exp" | "power" | "pow" | "rand" | "random" | "percent_rank"
        | "cume_dist" => DataType::Double,

        "now" | "current_timestamp" => DataType::Timestamp {
            precision: 3,
            with_time_zone: true,
        },
        "current_date" | "date" => DataType::Date,

        "json_parse" => DataType::Json,
        "json_format" => DataType::Varchar(None),
        _ => return None,
    };
    Some(data_type)
}

/// Folds argument types with the common supertype, `Unknown` on conflict.
fn fold_supertype(args: &[DataType]) -> DataType {
    args.iter()
        .try_fold(DataType::Unknown, |acc, ty| common_supertype(&acc, ty))
        .unwrap_or(DataType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_functions() {
        assert_eq!(return_type("COUNT", &[]), Some(DataType::Bigint));
        assert_eq!(
            return_type("approx_distinct", &[DataType::Varchar(None)]),
            Some(DataType::Bigint)
        );
    }

    #[test]
    fn test_sum_and_avg() {
        assert_eq!(return_type("sum", &[DataType::Integer]), Some(DataType::Bigint));
        assert_eq!(return_type("sum", &[DataType::Real]), Some(DataType::Real));
        assert_eq!(
            return_type("sum", &[DataType::decimal(10, 2)]),
            Some(DataType::decimal(38, 2))
        );
        assert_eq!(return_type("avg", &[DataType::Bigint]), Some(DataType::Double));
        assert_eq!(
            return_type("avg", &[DataType::decimal(5, 1)]),
            Some(DataType::decimal(5, 1))
        );
    }

    #[test]
    fn test_argument_typed_functions() {
        let varchar = DataType::Varchar(Some(4));
        assert_eq!(return_type("upper", &[varchar.clone()]), Some(varchar));
        assert_eq!(
            return_type("array_agg", &[DataType::Date]),
            Some(DataType::array(DataType::Date))
        );
        let ts = DataType::timestamp(6);
        assert_eq!(
            return_type("date_trunc", &[DataType::Varchar(Some(3)), ts.clone()]),
            Some(ts)
        );
    }

    #[test]
    fn test_supertype_functions() {
        assert_eq!(
            return_type("coalesce", &[DataType::Integer, DataType::Bigint, DataType::Unknown]),
            Some(DataType::Bigint)
        );
        assert_eq!(
            return_type("if", &[DataType::Boolean, DataType::Smallint, DataType::Integer]),
            Some(DataType::Integer)
        );
        assert_eq!(
            return_type("greatest", &[DataType::Boolean, DataType::Date]),
            Some(DataType::Unknown)
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(return_type("my_udf", &[DataType::Integer]), None);
    }
}
