//! SQL data type definitions.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Precision used for `DECIMAL` when none is given.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 38;
/// Largest decimal precision.
pub const MAX_DECIMAL_PRECISION: u8 = 38;
/// Fractional-second precision used for `TIME`/`TIMESTAMP` when none is given.
pub const DEFAULT_TIME_PRECISION: u8 = 3;
/// Largest `CHAR` length.
pub const MAX_CHAR_LENGTH: u32 = 65_536;

/// A field of a `ROW` type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowField {
    /// Optional field name.
    #[serde(default)]
    pub name: Option<String>,
    /// Field type.
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl RowField {
    /// Creates a named field.
    #[must_use]
    pub fn named(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
        }
    }

    /// Creates an anonymous field.
    #[must_use]
    pub const fn anonymous(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
        }
    }
}

/// SQL data types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean.
    Boolean,

    // Integer types
    /// 1-byte integer.
    Tinyint,
    /// 2-byte integer.
    Smallint,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    Bigint,

    // Floating point
    /// 4-byte float.
    Real,
    /// 8-byte float.
    Double,
    /// Exact decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },

    // String types
    /// Variable-length string with an optional bound.
    Varchar(Option<u32>),
    /// Fixed-length string.
    Char(u32),
    /// Variable-length binary.
    Varbinary,
    /// JSON document.
    Json,

    // Date/time types
    /// Calendar date.
    Date,
    /// Time of day.
    Time {
        /// Fractional-second digits.
        precision: u8,
        /// `WITH TIME ZONE`.
        with_time_zone: bool,
    },
    /// Date and time.
    Timestamp {
        /// Fractional-second digits.
        precision: u8,
        /// `WITH TIME ZONE`.
        with_time_zone: bool,
    },
    /// `INTERVAL YEAR TO MONTH`.
    IntervalYearToMonth,
    /// `INTERVAL DAY TO SECOND`.
    IntervalDayToSecond,

    // Structural types
    /// Array of elements.
    Array(Box<DataType>),
    /// Map from keys to values.
    Map(Box<DataType>, Box<DataType>),
    /// Row of (optionally named) fields.
    Row(Vec<RowField>),

    /// Type not known yet (e.g. a `NULL` literal or a column of a table with
    /// no schema).
    Unknown,
}

impl DataType {
    /// `DECIMAL(precision, scale)`.
    #[must_use]
    pub const fn decimal(precision: u8, scale: u8) -> Self {
        Self::Decimal { precision, scale }
    }

    /// Unbounded `VARCHAR`.
    #[must_use]
    pub const fn varchar() -> Self {
        Self::Varchar(None)
    }

    /// `TIMESTAMP(p)` without time zone.
    #[must_use]
    pub const fn timestamp(precision: u8) -> Self {
        Self::Timestamp {
            precision,
            with_time_zone: false,
        }
    }

    /// `ARRAY(element)`.
    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    /// `MAP(key, value)`.
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Returns true for the fixed-width integer types.
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::Tinyint | Self::Smallint | Self::Integer | Self::Bigint
        )
    }

    /// Returns true for `REAL` and `DOUBLE`.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(self, Self::Real | Self::Double)
    }

    /// Returns true for integral, decimal and floating types.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_floating() || matches!(self, Self::Decimal { .. })
    }

    /// Returns true for `VARCHAR` and `CHAR`.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::Varchar(_) | Self::Char(_))
    }

    /// Returns true for `DATE`, `TIME` and `TIMESTAMP`.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time { .. } | Self::Timestamp { .. })
    }

    /// Returns true for both interval types.
    #[must_use]
    pub const fn is_interval(&self) -> bool {
        matches!(self, Self::IntervalYearToMonth | Self::IntervalDayToSecond)
    }

    /// The number of decimal digits an integral type needs.
    #[must_use]
    pub const fn integral_digits(&self) -> Option<u8> {
        match self {
            Self::Tinyint => Some(3),
            Self::Smallint => Some(5),
            Self::Integer => Some(10),
            Self::Bigint => Some(19),
            _ => None,
        }
    }

    /// Returns the SQL representation of the data type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Boolean => String::from("BOOLEAN"),
            Self::Tinyint => String::from("TINYINT"),
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Real => String::from("REAL"),
            Self::Double => String::from("DOUBLE"),
            Self::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            Self::Varchar(None) => String::from("VARCHAR"),
            Self::Varchar(Some(len)) => format!("VARCHAR({len})"),
            Self::Char(len) => format!("CHAR({len})"),
            Self::Varbinary => String::from("VARBINARY"),
            Self::Json => String::from("JSON"),
            Self::Date => String::from("DATE"),
            Self::Time {
                precision,
                with_time_zone,
            } => temporal_sql("TIME", *precision, *with_time_zone),
            Self::Timestamp {
                precision,
                with_time_zone,
            } => temporal_sql("TIMESTAMP", *precision, *with_time_zone),
            Self::IntervalYearToMonth => String::from("INTERVAL YEAR TO MONTH"),
            Self::IntervalDayToSecond => String::from("INTERVAL DAY TO SECOND"),
            Self::Array(element) => format!("ARRAY({})", element.to_sql()),
            Self::Map(key, value) => format!("MAP({},{})", key.to_sql(), value.to_sql()),
            Self::Row(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|field| match &field.name {
                        Some(name) => format!(
                            "\"{}\" {}",
                            name.replace('"', "\"\""),
                            field.data_type.to_sql()
                        ),
                        None => field.data_type.to_sql(),
                    })
                    .collect();
                format!("ROW({})", fields.join(","))
            }
            Self::Unknown => String::from("UNKNOWN"),
        }
    }
}

fn temporal_sql(name: &str, precision: u8, with_time_zone: bool) -> String {
    if with_time_zone {
        format!("{name}({precision}) WITH TIME ZONE")
    } else {
        format!("{name}({precision})")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}
