use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use uuid::Uuid;

use super::data_type::DataType;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Null,
    // Numeric types
    SmallInt(i16),
    Integer(i64),
    Real(f64),
    Numeric(Decimal),
    // String types
    Text(String),
    // Boolean
    Boolean(bool),
    // Date/Time types
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    /// Elapsed time in microseconds
    Duration(i64),
    // Special types
    Uuid(Uuid),
    Json(String),
    Bytea(Vec<u8>),
    // Composite types
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
    /// Structured row value with named fields, in declaration order
    Struct(Vec<(String, Value)>),
    /// Opaque value known only by its textual representation
    Object(String),
}

impl Value {
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::SmallInt(i) => Some(*i as i64),
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Missing data: SQL-style NULL and floating point NaN.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Real(r) => r.is_nan(),
            _ => false,
        }
    }

    /// Coerce to a float for numeric comparisons. Text is parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::SmallInt(i) => Some(f64::from(*i)),
            Self::Integer(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            Self::Numeric(d) => d.to_f64(),
            Self::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Coerce to a UTC instant. Naive values are taken to be UTC, dates are
    /// taken at midnight, text is parsed.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            Self::Timestamp(t) => Some(t.and_utc()),
            Self::TimestampTz(t) => Some(*t),
            Self::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Position of the value on a real axis, used to bin histograms.
    /// Timestamps and durations map to microseconds.
    #[must_use]
    pub fn ordinal(&self) -> Option<f64> {
        match self {
            Self::SmallInt(_) | Self::Integer(_) | Self::Real(_) | Self::Numeric(_) => self.as_f64(),
            Self::Date(_) | Self::Timestamp(_) | Self::TimestampTz(_) => {
                self.as_timestamp().map(|t| t.timestamp_micros() as f64)
            }
            Self::Duration(us) => Some(*us as f64),
            _ => None,
        }
    }

    /// Deterministic string form used whenever values are grouped or
    /// counted, regardless of whether the value is a composite.
    #[must_use]
    pub fn grouping_key(&self) -> String {
        self.to_string()
    }

    /// Natural ordering between two values. `None` when the values are
    /// incomparable (mixed kinds, NaN, composites).
    #[must_use]
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::SmallInt(_) | Self::Integer(_), Self::SmallInt(_) | Self::Integer(_)) => {
                Some(self.as_int()?.cmp(&other.as_int()?))
            }
            (Self::SmallInt(_) | Self::Integer(_), Self::Real(r)) => cmp_int_real(self.as_int()?, *r),
            (Self::Real(r), Self::SmallInt(_) | Self::Integer(_)) => {
                cmp_int_real(other.as_int()?, *r).map(Ordering::reverse)
            }
            (Self::SmallInt(_) | Self::Integer(_), Self::Numeric(d)) => Some(Decimal::from(self.as_int()?).cmp(d)),
            (Self::Numeric(d), Self::SmallInt(_) | Self::Integer(_)) => Some(d.cmp(&Decimal::from(other.as_int()?))),
            (Self::Numeric(a), Self::Numeric(b)) => Some(a.cmp(b)),
            (Self::Numeric(d), Self::Real(r)) => cmp_decimal_real(d, *r),
            (Self::Real(r), Self::Numeric(d)) => cmp_decimal_real(d, *r).map(Ordering::reverse),
            (Self::Real(a), Self::Real(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (
                Self::Date(_) | Self::Timestamp(_) | Self::TimestampTz(_),
                Self::Date(_) | Self::Timestamp(_) | Self::TimestampTz(_),
            ) => Some(self.as_timestamp()?.cmp(&other.as_timestamp()?)),
            (Self::Duration(a), Self::Duration(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Bytea(a), Self::Bytea(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting. Missing values always go last and
    /// incomparable values fall back to kind rank, then canonical string.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        self.try_cmp(other).unwrap_or_else(|| {
            self.kind_rank()
                .cmp(&other.kind_rank())
                .then_with(|| self.grouping_key().cmp(&other.grouping_key()))
        })
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::SmallInt(_) | Self::Integer(_) | Self::Real(_) | Self::Numeric(_) => 2,
            Self::Date(_) | Self::Timestamp(_) | Self::TimestampTz(_) => 3,
            Self::Duration(_) => 4,
            Self::Text(_) => 5,
            Self::Uuid(_) => 6,
            Self::Json(_) => 7,
            Self::Bytea(_) => 8,
            Self::List(_) => 9,
            Self::Map(_) => 10,
            Self::Struct(_) => 11,
            Self::Object(_) => 12,
        }
    }

    /// Type a column would be given if it held only this value.
    #[must_use]
    pub fn inferred_type(&self) -> Option<DataType> {
        let data_type = match self {
            Self::Null => return None,
            Self::Real(r) if r.is_nan() => return None,
            Self::SmallInt(_) => DataType::SmallInt,
            Self::Integer(_) => DataType::Integer,
            Self::Real(_) => DataType::Real,
            Self::Numeric(d) => DataType::Numeric { precision: 38, scale: d.scale() as u8 },
            Self::Text(_) => DataType::Text,
            Self::Boolean(_) => DataType::Boolean,
            Self::Date(_) => DataType::Date,
            Self::Timestamp(_) => DataType::Timestamp,
            Self::TimestampTz(_) => DataType::TimestampTz,
            Self::Duration(_) => DataType::Duration,
            Self::Uuid(_) => DataType::Uuid,
            Self::Json(_) => DataType::Json,
            Self::Bytea(_) => DataType::Bytea,
            Self::List(_) => DataType::List,
            Self::Map(_) => DataType::Map,
            Self::Struct(fields) => DataType::Struct {
                fields: fields.iter().map(|(name, _)| name.clone()).collect(),
            },
            Self::Object(_) => DataType::Object,
        };
        Some(data_type)
    }

    /// Convert a parsed JSON value. Arrays become lists and objects become
    /// maps, keeping key order.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Real))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Rendering of a value nested inside a composite: text is quoted.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Json(s) => write!(f, "'{s}'"),
            other => write!(f, "{other}"),
        }
    }
}

/// Parse the timestamp notations accepted in filters and text columns.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&t));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn format_real(r: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if r.is_nan() {
        f.write_str("nan")
    } else if r.is_infinite() {
        f.write_str(if r > 0.0 { "inf" } else { "-inf" })
    } else if r.fract() == 0.0 && r.abs() < 1e16 {
        write!(f, "{r:.1}")
    } else {
        write!(f, "{r}")
    }
}

fn format_duration(micros: i64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let days = micros.div_euclid(MICROS_PER_DAY);
    let rest = micros.rem_euclid(MICROS_PER_DAY);
    let secs = rest / MICROS_PER_SECOND;
    let frac = rest % MICROS_PER_SECOND;
    write!(f, "{days} days {:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)?;
    if frac != 0 {
        write!(f, ".{frac:06}")?;
    }
    Ok(())
}

fn format_fields(fields: &[(String, Value)], open: char, close: char, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_char(open)?;
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if open == '{' {
            write!(f, "'{name}': ")?;
        } else {
            write!(f, "{name}: ")?;
        }
        value.fmt_nested(f)?;
    }
    f.write_char(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::SmallInt(i) => write!(f, "{i}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => format_real(*r, f),
            Self::Numeric(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::TimestampTz(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f%:z")),
            Self::Duration(us) => format_duration(*us, f),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
            Self::Bytea(b) => write!(f, "\\x{}", hex::encode(b)),
            Self::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_char(']')
            }
            Self::Map(entries) => format_fields(entries, '{', '}', f),
            Self::Struct(fields) => format_fields(fields, '(', ')', f),
            Self::Object(repr) => write!(f, "{repr}"),
        }
    }
}

/// Exact integer/float ordering, so large integers stay totally ordered
/// against floats that cannot represent them.
fn cmp_int_real(i: i64, r: f64) -> Option<Ordering> {
    // 2^63: the smallest float above i64::MAX, and exactly i64::MIN negated
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if r.is_nan() {
        return None;
    }
    if r >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if r < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let whole = r.trunc();
    let fraction = r - whole;
    Some(
        i.cmp(&(whole as i64))
            .then_with(|| 0.0_f64.partial_cmp(&fraction).unwrap_or(Ordering::Equal)),
    )
}

fn cmp_decimal_real(d: &Decimal, r: f64) -> Option<Ordering> {
    match Decimal::from_f64_retain(r) {
        Some(exact) => Some(d.cmp(&exact)),
        None => d.to_f64()?.partial_cmp(&r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_rendering() {
        assert_eq!(Value::Real(2.0).to_string(), "2.0");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Real(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::Boolean(true).to_string(), "True");
        assert_eq!(Value::Duration(90 * 1_000_000).to_string(), "0 days 00:01:30");
        assert_eq!(Value::Duration(MICROS_PER_DAY + 500_000).to_string(), "1 days 00:00:00.500000");
    }

    #[test]
    fn test_struct_rendering_keeps_field_names() {
        let value = Value::Struct(vec![
            ("field_a".to_string(), Value::Text("x".to_string())),
            ("field_b".to_string(), Value::Text("y".to_string())),
        ]);
        assert_eq!(value.to_string(), "(field_a: 'x', field_b: 'y')");
    }

    #[test]
    fn test_composite_grouping_key_is_deterministic() {
        let a = Value::List(vec![Value::Integer(1), Value::Text("a".to_string())]);
        let b = Value::List(vec![Value::Integer(1), Value::Text("a".to_string())]);
        assert_eq!(a.grouping_key(), b.grouping_key());
        assert_eq!(a.grouping_key(), "[1, 'a']");

        let m = Value::Map(vec![("k".to_string(), Value::Integer(2))]);
        assert_eq!(m.grouping_key(), "{'k': 2}");
    }

    #[test]
    fn test_try_cmp_cross_numeric() {
        assert_eq!(Value::Integer(2).try_cmp(&Value::Real(2.5)), Some(Ordering::Less));
        assert_eq!(Value::Real(f64::NAN).try_cmp(&Value::Real(1.0)), None);
        assert_eq!(Value::Text("a".to_string()).try_cmp(&Value::Integer(1)), None);
    }

    #[test]
    fn test_try_cmp_large_integers_against_reals() {
        let two_pow_53 = 1_i64 << 53;
        let boundary = Value::Real(two_pow_53 as f64);
        assert_eq!(Value::Integer(two_pow_53).try_cmp(&boundary), Some(Ordering::Equal));
        assert_eq!(Value::Integer(two_pow_53 + 1).try_cmp(&boundary), Some(Ordering::Greater));
        assert_eq!(boundary.try_cmp(&Value::Integer(two_pow_53 + 1)), Some(Ordering::Less));
        assert_eq!(Value::Integer(i64::MAX).try_cmp(&Value::Real(i64::MAX as f64)), Some(Ordering::Less));
        assert_eq!(Value::Integer(-3).try_cmp(&Value::Real(-2.5)), Some(Ordering::Less));
        assert_eq!(Value::Integer(-2).try_cmp(&Value::Real(-2.5)), Some(Ordering::Greater));
        assert_eq!(Value::Integer(1).try_cmp(&Value::Real(f64::NEG_INFINITY)), Some(Ordering::Greater));

        let big = Value::Numeric(Decimal::from(two_pow_53 + 1));
        assert_eq!(big.try_cmp(&boundary), Some(Ordering::Greater));
        assert_eq!(Value::Numeric(Decimal::new(25, 1)).try_cmp(&Value::Integer(2)), Some(Ordering::Greater));
    }

    #[test]
    fn test_mixed_int_real_sort_is_consistent() {
        let two_pow_53 = 1_i64 << 53;
        let mut values = vec![
            Value::Integer(two_pow_53 + 1),
            Value::Real(two_pow_53 as f64),
            Value::Integer(two_pow_53),
            Value::Real(1.5),
        ];
        values.sort_by(Value::sort_cmp);
        assert_eq!(values[0], Value::Real(1.5));
        assert_eq!(values[3], Value::Integer(two_pow_53 + 1));
    }

    #[test]
    fn test_sort_cmp_nulls_last() {
        assert_eq!(Value::Null.sort_cmp(&Value::Integer(1)), Ordering::Greater);
        assert_eq!(Value::Integer(1).sort_cmp(&Value::Real(f64::NAN)), Ordering::Less);
        assert_eq!(Value::Integer(1).sort_cmp(&Value::Text("a".to_string())), Ordering::Less);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value = serde_json::json!({"a": [1, 2.5, null], "b": "x"});
        let value = Value::from_json(&json);
        assert_eq!(
            value,
            Value::Map(vec![
                (
                    "a".to_string(),
                    Value::List(vec![Value::Integer(1), Value::Real(2.5), Value::Null])
                ),
                ("b".to_string(), Value::Text("x".to_string())),
            ])
        );
    }
}
