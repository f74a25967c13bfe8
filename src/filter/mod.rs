/// Backend-independent row filters
///
/// A `Filter` names a column, an operator and the values to compare
/// against. Filters arrive in two wire shapes: the legacy column search
/// `{id, value, type: "contains"}` and the structured
/// `{column, operator, comparativeValues}`.

pub mod predicate;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::fmt;
use std::str::FromStr;

use crate::core::EngineError;

pub use predicate::{Predicate, compile_filters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterOperator {
    IsEqual,
    IsNotEqual,
    TextContains,
    TextDoesNotContain,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    OutsideOf,
    IsOneOf,
    IsNotOneOf,
    IsNull,
    IsNotNull,
    Between,
    IsAfter,
    IsBefore,
    IsOn,
    IsRelativeToday,
}

/// Number of comparative values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Nullary,
    Unary,
    Binary,
    Variadic,
}

impl Arity {
    /// Fewest values a filter needs before it can be applied.
    #[must_use]
    pub const fn min_values(self) -> usize {
        match self {
            Self::Nullary => 0,
            Self::Unary | Self::Variadic => 1,
            Self::Binary => 2,
        }
    }
}

impl FilterOperator {
    pub const ALL: [Self; 18] = [
        Self::IsEqual,
        Self::IsNotEqual,
        Self::TextContains,
        Self::TextDoesNotContain,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::OutsideOf,
        Self::IsOneOf,
        Self::IsNotOneOf,
        Self::IsNull,
        Self::IsNotNull,
        Self::Between,
        Self::IsAfter,
        Self::IsBefore,
        Self::IsOn,
        Self::IsRelativeToday,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IsEqual => "is-equal",
            Self::IsNotEqual => "is-not-equal",
            Self::TextContains => "text-contains",
            Self::TextDoesNotContain => "text-does-not-contain",
            Self::GreaterThan => "greater-than",
            Self::GreaterThanOrEqual => "greater-than-or-equal",
            Self::LessThan => "less-than",
            Self::LessThanOrEqual => "less-than-or-equal",
            Self::OutsideOf => "outside-of",
            Self::IsOneOf => "is-one-of",
            Self::IsNotOneOf => "is-not-one-of",
            Self::IsNull => "is-null",
            Self::IsNotNull => "is-not-null",
            Self::Between => "between",
            Self::IsAfter => "is-after",
            Self::IsBefore => "is-before",
            Self::IsOn => "is-on",
            Self::IsRelativeToday => "is-relative-today",
        }
    }

    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::IsNull | Self::IsNotNull => Arity::Nullary,
            Self::Between | Self::OutsideOf => Arity::Binary,
            Self::IsOneOf | Self::IsNotOneOf | Self::TextContains | Self::TextDoesNotContain => {
                Arity::Variadic
            }
            _ => Arity::Unary,
        }
    }
}

impl FromStr for FilterOperator {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| EngineError::InvalidFilter(format!("Invalid operator: {s}")))
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(rename = "comparativeValues")]
    pub comparative_values: Vec<JsonValue>,
}

impl Filter {
    #[must_use]
    pub fn new(column: impl Into<String>, operator: FilterOperator, comparative_values: Vec<JsonValue>) -> Self {
        Self {
            column: column.into(),
            operator,
            comparative_values,
        }
    }

    /// Parse either wire shape.
    pub fn parse(input: &JsonValue) -> Result<Self, EngineError> {
        let object = input
            .as_object()
            .ok_or_else(|| EngineError::InvalidFilter(format!("expected an object, got {input}")))?;

        if object.get("type").and_then(JsonValue::as_str) == Some("contains") {
            let (Some(id), Some(value)) = (object.get("id"), object.get("value")) else {
                return Err(EngineError::InvalidFilter(
                    "Missing required keys for contains filter: id and value".to_string(),
                ));
            };
            return Ok(Self::new(json_to_string(id), FilterOperator::TextContains, vec![value.clone()]));
        }

        let (Some(column), Some(operator), Some(values)) = (
            object.get("column"),
            object.get("operator"),
            object.get("comparativeValues"),
        ) else {
            return Err(EngineError::InvalidFilter(
                "Missing required keys: column, operator, comparativeValues".to_string(),
            ));
        };

        let operator = operator
            .as_str()
            .ok_or_else(|| EngineError::InvalidFilter(format!("Invalid operator: {operator}")))?
            .parse::<FilterOperator>()?;

        let comparative_values = match values {
            JsonValue::Array(items) => items.clone(),
            other => {
                return Err(EngineError::InvalidFilter(format!(
                    "comparativeValues must be an array, got {other}"
                )));
            }
        };

        Ok(Self::new(json_to_string(column), operator, comparative_values))
    }

    /// Structured wire shape.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        json!({
            "column": self.column,
            "operator": self.operator.as_str(),
            "comparativeValues": self.comparative_values,
        })
    }

    /// Legacy wire shape, only available for single-value text searches.
    #[must_use]
    pub fn to_legacy_json(&self) -> Option<JsonValue> {
        match (self.operator, self.comparative_values.as_slice()) {
            (FilterOperator::TextContains, [value]) => Some(json!({
                "id": self.column,
                "value": value,
                "type": "contains",
            })),
            _ => None,
        }
    }

    /// Stable textual key, used to compare filter lists regardless of order.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        self.to_json().to_string()
    }

    /// True when enough comparative values are present for the operator.
    #[must_use]
    pub fn has_required_values(&self) -> bool {
        self.comparative_values.len() >= self.operator.arity().min_values()
    }
}

/// String form of a JSON scalar: strings without quotes, everything else
/// as JSON text.
#[must_use]
pub fn json_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
