/// Filter compilation and row evaluation
///
/// Each `Filter` is compiled once against the column it references into a
/// `Predicate` holding pre-parsed comparands. Filters that cannot be applied
/// (unknown column, too few values, unparseable comparands) are dropped
/// rather than failing the whole request.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

use super::{Filter, FilterOperator, json_to_string};
use crate::core::{Column, DataType, Row, Value, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    fn holds<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Lt => left < right,
            Self::Le => left <= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Bounds {
    Numeric(f64, f64),
    Temporal(DateTime<Utc>, DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
enum Test {
    Contains { needles: Vec<String>, negate: bool },
    Numeric { cmp: Comparison, value: f64, negate: bool },
    Temporal { cmp: Comparison, value: DateTime<Utc>, negate: bool },
    TextEquals { value: String, negate: bool },
    Range { bounds: Bounds, inside: bool },
    BooleanIn { set: Vec<bool>, negate: bool },
    NumberIn { set: Vec<f64>, negate: bool },
    TextIn { set: HashSet<String>, negate: bool },
    Null { negate: bool },
    SameDay(NaiveDate),
    Since(DateTime<Utc>),
}

/// A compiled filter bound to a column position.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: usize,
    test: Test,
}

impl Predicate {
    /// Compile `filter` against the column at `column`. `now` anchors
    /// relative date filters. Returns `None` when the filter can't apply.
    #[must_use]
    pub fn compile(filter: &Filter, column: usize, data_type: &DataType, now: DateTime<Utc>) -> Option<Self> {
        if !filter.has_required_values() {
            return None;
        }
        let values = &filter.comparative_values;
        let temporal = data_type.is_temporal();

        let test = match filter.operator {
            FilterOperator::TextContains | FilterOperator::TextDoesNotContain => Test::Contains {
                needles: values.iter().map(json_to_string).collect(),
                negate: filter.operator == FilterOperator::TextDoesNotContain,
            },
            FilterOperator::IsEqual => compare(&values[0], Comparison::Eq, false, temporal, data_type)?,
            FilterOperator::IsNotEqual => compare(&values[0], Comparison::Eq, true, temporal, data_type)?,
            FilterOperator::GreaterThan => compare(&values[0], Comparison::Gt, false, temporal, data_type)?,
            FilterOperator::GreaterThanOrEqual => compare(&values[0], Comparison::Ge, false, temporal, data_type)?,
            FilterOperator::LessThan => compare(&values[0], Comparison::Lt, false, temporal, data_type)?,
            FilterOperator::LessThanOrEqual => compare(&values[0], Comparison::Le, false, temporal, data_type)?,
            FilterOperator::Between | FilterOperator::OutsideOf => Test::Range {
                bounds: bounds(&values[0], &values[1], temporal)?,
                inside: filter.operator == FilterOperator::Between,
            },
            FilterOperator::IsOneOf | FilterOperator::IsNotOneOf => {
                membership(values, data_type, filter.operator == FilterOperator::IsNotOneOf)?
            }
            FilterOperator::IsNull => Test::Null { negate: false },
            FilterOperator::IsNotNull => Test::Null { negate: true },
            FilterOperator::IsAfter => Test::Temporal { cmp: Comparison::Ge, value: json_timestamp(&values[0])?, negate: false },
            FilterOperator::IsBefore => Test::Temporal { cmp: Comparison::Le, value: json_timestamp(&values[0])?, negate: false },
            FilterOperator::IsOn => Test::SameDay(json_timestamp(&values[0])?.date_naive()),
            FilterOperator::IsRelativeToday => relative_to(&json_to_string(&values[0]), now)?,
        };

        Some(Self { column, test })
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(self.column);
        match &self.test {
            Test::Contains { needles, negate } => {
                let haystack = if value.is_null() { String::new() } else { value.grouping_key() };
                let found = !value.is_null() && needles.iter().any(|n| haystack.contains(n.as_str()));
                found != *negate
            }
            Test::Numeric { cmp, value: target, negate } => {
                let hit = value.as_f64().is_some_and(|v| cmp.holds(&v, target));
                hit != *negate
            }
            Test::Temporal { cmp, value: target, negate } => {
                value.as_timestamp().is_some_and(|v| cmp.holds(&v, target)) != *negate
            }
            Test::TextEquals { value: target, negate } => {
                let hit = !value.is_null() && value.grouping_key() == *target;
                hit != *negate
            }
            Test::Range { bounds, inside } => {
                let within = match bounds {
                    Bounds::Numeric(low, high) => value.as_f64().map(|v| *low <= v && v <= *high),
                    Bounds::Temporal(low, high) => value.as_timestamp().map(|v| *low <= v && v <= *high),
                };
                // Missing values are never inside a range, so they are outside of it.
                within.unwrap_or(false) == *inside
            }
            Test::BooleanIn { set, negate } => value.as_bool().is_some_and(|b| set.contains(&b)) != *negate,
            Test::NumberIn { set, negate } => {
                value.as_f64().is_some_and(|v| set.contains(&v)) != *negate
            }
            Test::TextIn { set, negate } => {
                let hit = !value.is_null() && set.contains(&value.grouping_key().to_lowercase());
                hit != *negate
            }
            Test::Null { negate } => value.is_null() != *negate,
            Test::SameDay(day) => value.as_timestamp().is_some_and(|v| v.date_naive() == *day),
            Test::Since(start) => value.as_timestamp().is_some_and(|v| v >= *start),
        }
    }
}

fn json_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn json_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => parse_timestamp(s),
        // Bare numbers are epoch milliseconds, as produced by date pickers.
        JsonValue::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn compare(
    target: &JsonValue,
    cmp: Comparison,
    negate: bool,
    temporal: bool,
    data_type: &DataType,
) -> Option<Test> {
    if temporal {
        return json_timestamp(target).map(|value| Test::Temporal { cmp, value, negate });
    }
    if let Some(value) = json_number(target) {
        return Some(Test::Numeric { cmp, value, negate });
    }
    let textual = matches!(data_type, DataType::Text | DataType::Categorical | DataType::Object);
    (cmp == Comparison::Eq && textual).then(|| Test::TextEquals {
        value: json_to_string(target),
        negate,
    })
}

fn bounds(low: &JsonValue, high: &JsonValue, temporal: bool) -> Option<Bounds> {
    if !temporal {
        if let (Some(low), Some(high)) = (json_number(low), json_number(high)) {
            return Some(Bounds::Numeric(low, high));
        }
    }
    Some(Bounds::Temporal(json_timestamp(low)?, json_timestamp(high)?))
}

fn membership(values: &[JsonValue], data_type: &DataType, negate: bool) -> Option<Test> {
    match data_type {
        DataType::Boolean => Some(Test::BooleanIn {
            set: values
                .iter()
                .map(|v| json_to_string(v).eq_ignore_ascii_case("true"))
                .collect(),
            negate,
        }),
        dt if dt.is_numeric() => Some(Test::NumberIn {
            set: values.iter().map(json_number).collect::<Option<Vec<_>>>()?,
            negate,
        }),
        _ => Some(Test::TextIn {
            set: values.iter().map(|v| json_to_string(v).to_lowercase()).collect(),
            negate,
        }),
    }
}

fn relative_to(keyword: &str, now: DateTime<Utc>) -> Option<Test> {
    let today = now.date_naive();
    let test = match keyword {
        "today" => Test::SameDay(today),
        "yesterday" => Test::SameDay(today.pred_opt()?),
        "tomorrow" => Test::SameDay(today.succ_opt()?),
        "week-ago" => Test::Since(now - Duration::weeks(1)),
        "month-ago" => Test::Since(now.checked_sub_months(Months::new(1))?),
        "quarter-ago" => Test::Since(now.checked_sub_months(Months::new(3))?),
        "half-year-ago" => Test::Since(now.checked_sub_months(Months::new(6))?),
        "year-ago" => Test::Since(now.checked_sub_months(Months::new(12))?),
        _ => return None,
    };
    Some(test)
}

/// Compile every applicable filter against `columns`. Filters on unknown
/// columns or with unusable values are dropped.
#[must_use]
pub fn compile_filters(filters: &[Filter], columns: &[Column], now: DateTime<Utc>) -> Vec<Predicate> {
    filters
        .iter()
        .filter_map(|filter| {
            let Some(index) = columns.iter().position(|c| c.name == filter.column) else {
                log::debug!("Dropping filter on unknown column '{}'", filter.column);
                return None;
            };
            let predicate = Predicate::compile(filter, index, &columns[index].data_type, now);
            if predicate.is_none() {
                log::debug!(
                    "Dropping filter {} on '{}': comparative values {:?} not applicable",
                    filter.operator,
                    filter.column,
                    filter.comparative_values
                );
            }
            predicate
        })
        .collect()
}
