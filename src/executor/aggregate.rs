/// Column aggregates (MIN/MAX, DISTINCT) over already materialized values
///
/// Missing values are skipped by every aggregate here.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::core::{EngineError, Value};

pub struct Aggregator;

impl Aggregator {
    /// Smallest and largest non-null value under the natural ordering.
    /// Fails with `TypeMismatch` when two values cannot be compared.
    pub fn min_max<'a>(values: impl IntoIterator<Item = &'a Value>) -> Result<Option<(&'a Value, &'a Value)>, EngineError> {
        let mut values = values.into_iter().filter(|v| !v.is_null());
        let Some(first) = values.next() else {
            return Ok(None);
        };

        let (mut min, mut max) = (first, first);
        for value in values {
            let (Some(vs_min), Some(vs_max)) = (value.try_cmp(min), value.try_cmp(max)) else {
                return Err(EngineError::TypeMismatch);
            };
            if vs_min == Ordering::Less {
                min = value;
            }
            if vs_max == Ordering::Greater {
                max = value;
            }
        }
        Ok(Some((min, max)))
    }

    /// First `limit` distinct non-null values, compared by canonical string.
    /// Sorted when every value is comparable with the others, otherwise in
    /// first-seen order.
    #[must_use]
    pub fn distinct<'a>(values: impl IntoIterator<Item = &'a Value>, limit: usize) -> Vec<Value> {
        let mut seen = HashSet::new();
        let mut distinct: Vec<Value> = Vec::new();
        for value in values {
            if distinct.len() >= limit {
                break;
            }
            if !value.is_null() && seen.insert(value.grouping_key()) {
                distinct.push(value.clone());
            }
        }

        let comparable = distinct
            .first()
            .is_some_and(|first| distinct.iter().all(|v| v.try_cmp(first).is_some()));
        if comparable {
            distinct.sort_by(Value::sort_cmp);
        }
        distinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Integer(v)).collect()
    }

    #[test]
    fn test_min_max() {
        let mut values = ints(&[3, 1, 4, 1, 5]);
        values.push(Value::Null);
        let (min, max) = Aggregator::min_max(&values).unwrap().unwrap();
        assert_eq!(min, &Value::Integer(1));
        assert_eq!(max, &Value::Integer(5));
    }

    #[test]
    fn test_min_max_empty_and_mixed() {
        assert_eq!(Aggregator::min_max(&[Value::Null, Value::Real(f64::NAN)]).unwrap(), None);
        let mixed = vec![Value::Integer(1), Value::Text("a".to_string())];
        assert!(matches!(Aggregator::min_max(&mixed), Err(EngineError::TypeMismatch)));
    }

    #[test]
    fn test_distinct_sorted_and_capped() {
        let values = ints(&[5, 3, 5, 1, 3, 9]);
        assert_eq!(Aggregator::distinct(&values, 10), ints(&[1, 3, 5, 9]));
        assert_eq!(Aggregator::distinct(&values, 2), ints(&[3, 5]));
    }

    #[test]
    fn test_distinct_unhashable_keeps_first_seen_order() {
        let values = vec![
            Value::List(vec![Value::Integer(2)]),
            Value::Integer(1),
            Value::List(vec![Value::Integer(2)]),
        ];
        let distinct = Aggregator::distinct(&values, 10);
        assert_eq!(distinct, vec![Value::List(vec![Value::Integer(2)]), Value::Integer(1)]);
    }
}
