/// Row to record conversion
///
/// `Json` records only ever hold JSON primitives: numbers, strings, booleans
/// and null. Anything richer is rendered to its display string, binary data
/// is base64-encoded, and long strings are cut to a fixed length.

use base64::Engine;
use base64::engine::general_purpose;
use serde_json::{Map, Number, Value as JsonValue};

use crate::core::{Column, Row, Value};

/// Longest string cell sent to the frontend, in characters.
pub const DEFAULT_MAX_STRING_CELL_LENGTH: usize = 1000;

const TRUNCATION_MARK: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordMode {
    /// Values as stored
    Native,
    /// JSON-safe primitives
    #[default]
    Json,
}

pub type NativeRecord = Vec<(String, Value)>;
pub type JsonRecord = Map<String, JsonValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    Native(Vec<NativeRecord>),
    Json(Vec<JsonRecord>),
}

impl Records {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Native(records) => records.len(),
            Self::Json(records) => records.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON records, converting native ones if needed.
    #[must_use]
    pub fn into_json(self) -> Vec<JsonRecord> {
        match self {
            Self::Json(records) => records,
            Self::Native(records) => records
                .into_iter()
                .map(|record| {
                    record
                        .into_iter()
                        .map(|(name, value)| (name, to_json_value(&value, DEFAULT_MAX_STRING_CELL_LENGTH)))
                        .collect()
                })
                .collect(),
        }
    }
}

#[must_use]
pub fn native_records(columns: &[Column], rows: &[Row]) -> Vec<NativeRecord> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(idx, column)| (column.name.clone(), row.get(idx).clone()))
                .collect()
        })
        .collect()
}

#[must_use]
pub fn json_records(columns: &[Column], rows: &[Row], max_string_length: usize) -> Vec<JsonRecord> {
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(idx, column)| (column.name.clone(), to_json_value(row.get(idx), max_string_length)))
                .collect()
        })
        .collect()
}

/// Coerce a single cell to a JSON primitive.
#[must_use]
pub fn to_json_value(value: &Value, max_string_length: usize) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::SmallInt(i) => JsonValue::from(*i),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(r) if r.is_nan() => JsonValue::Null,
        Value::Real(r) => Number::from_f64(*r).map_or_else(|| JsonValue::String(value.to_string()), JsonValue::Number),
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Text(s) | Value::Json(s) => JsonValue::String(truncate(s, max_string_length)),
        Value::Bytea(bytes) => {
            let keep = (max_string_length / 4) * 3;
            let bytes = &bytes[..bytes.len().min(keep)];
            JsonValue::String(general_purpose::STANDARD.encode(bytes))
        }
        Value::Numeric(_)
        | Value::Date(_)
        | Value::Timestamp(_)
        | Value::TimestampTz(_)
        | Value::Duration(_)
        | Value::Uuid(_) => JsonValue::String(value.to_string()),
        Value::List(_) | Value::Map(_) | Value::Struct(_) | Value::Object(_) => {
            JsonValue::String(truncate(&value.to_string(), max_string_length))
        }
    }
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some(_) if max == 0 => String::new(),
        Some(_) => {
            let mut out: String = s.chars().take(max - 1).collect();
            out.push(TRUNCATION_MARK);
            out
        }
    }
}
