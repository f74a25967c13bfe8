use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column, as reported by the table backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    // Numeric types
    SmallInt,
    Integer,
    Real,
    Numeric { precision: u8, scale: u8 },
    // String types
    Text,
    Categorical,
    // Boolean
    Boolean,
    // Date/Time types
    Date,
    Timestamp,
    TimestampTz,
    Duration,
    // Special types
    Uuid,
    Json,
    Bytea,
    // Composite types
    List,
    Map,
    Struct { fields: Vec<String> },
    /// Opaque or mixed values
    Object,
}

impl DataType {
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::SmallInt | Self::Integer | Self::Real | Self::Numeric { .. }
        )
    }

    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp | Self::TimestampTz)
    }

    /// Numbers, timestamps and durations: anything whose range can be plotted
    /// on a histogram.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        self.is_numeric() || self.is_temporal() || matches!(self, Self::Duration)
    }

    /// True when every value of this type serializes to a JSON number.
    /// Decimals are excluded, they are sent as strings.
    #[must_use]
    pub const fn is_json_number(&self) -> bool {
        matches!(self, Self::SmallInt | Self::Integer | Self::Real)
    }

    /// Merge two inferred types into the narrowest type holding both.
    #[must_use]
    pub fn unify(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::SmallInt, Self::Integer) | (Self::Integer, Self::SmallInt) => Self::Integer,
            (Self::SmallInt | Self::Integer | Self::Real, Self::SmallInt | Self::Integer | Self::Real) => {
                Self::Real
            }
            (Self::Date | Self::Timestamp, Self::Date | Self::Timestamp) => Self::Timestamp,
            (Self::Text, Self::Categorical) | (Self::Categorical, Self::Text) => Self::Text,
            _ => Self::Object,
        }
    }

    /// Backend-reported type tag, e.g. `int64` or `datetime64[ns, UTC]`.
    #[must_use]
    pub fn type_tag(&self) -> String {
        match self {
            Self::SmallInt => "int16".to_string(),
            Self::Integer => "int64".to_string(),
            Self::Real => "float64".to_string(),
            Self::Numeric { precision, scale } => format!("decimal({precision},{scale})"),
            Self::Text => "string".to_string(),
            Self::Categorical => "category".to_string(),
            Self::Boolean => "bool".to_string(),
            Self::Date => "date".to_string(),
            Self::Timestamp => "datetime64[ns]".to_string(),
            Self::TimestampTz => "datetime64[ns, UTC]".to_string(),
            Self::Duration => "timedelta64[ns]".to_string(),
            Self::Uuid => "uuid".to_string(),
            Self::Json => "json".to_string(),
            Self::Bytea => "binary".to_string(),
            Self::List => "list".to_string(),
            Self::Map => "map".to_string(),
            Self::Struct { fields } => format!("struct<{}>", fields.join(",")),
            Self::Object => "object".to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_tag())
    }
}
