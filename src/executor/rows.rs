/// Row-level operators shared by every backend
///
/// Execution order used by the browse pipeline:
/// 1. filter (all predicates must hold)
/// 2. stable multi-key sort
/// 3. slice / sample
/// 4. projection

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cmp::Ordering;

use crate::core::{Row, Value};
use crate::filter::Predicate;

/// Resolved sort key: column position and direction.
pub type SortKey = (usize, bool);

pub struct RowExecutor;

impl RowExecutor {
    /// Keep rows for which every predicate holds.
    #[must_use]
    pub fn filter(rows: Vec<Row>, predicates: &[Predicate]) -> Vec<Row> {
        if predicates.is_empty() {
            return rows;
        }
        rows.into_iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .collect()
    }

    /// Stable sort by several keys; later keys break ties of earlier ones.
    /// Missing values sort last in both directions.
    pub fn sort(rows: &mut [Row], keys: &[SortKey]) {
        if keys.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            keys.iter().fold(Ordering::Equal, |acc, &(idx, ascending)| {
                acc.then_with(|| Self::compare_keyed(a.get(idx), b.get(idx), ascending))
            })
        });
    }

    fn compare_keyed(a: &Value, b: &Value, ascending: bool) -> Ordering {
        let ordering = a.sort_cmp(b);
        if ascending || a.is_null() || b.is_null() {
            ordering
        } else {
            ordering.reverse()
        }
    }

    /// Zero-based window of at most `count` rows starting at `offset`.
    #[must_use]
    pub fn slice(rows: Vec<Row>, offset: usize, count: usize) -> Vec<Row> {
        rows.into_iter().skip(offset).take(count).collect()
    }

    /// Random subset of at most `n` rows, in source order. The same seed
    /// always selects the same rows.
    #[must_use]
    pub fn sample(rows: Vec<Row>, n: usize, seed: Option<u64>) -> Vec<Row> {
        if n >= rows.len() {
            return rows;
        }
        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let mut picked = rand::seq::index::sample(&mut rng, rows.len(), n).into_vec();
        picked.sort_unstable();

        let mut picked = picked.into_iter().peekable();
        rows.into_iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                if picked.peek() == Some(&idx) {
                    picked.next();
                    Some(row)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Project rows onto the given column positions, in that order.
    #[must_use]
    pub fn select(rows: Vec<Row>, indices: &[usize]) -> Vec<Row> {
        rows.into_iter()
            .map(|row| Row::new(indices.iter().map(|&idx| row.get(idx).clone()).collect()))
            .collect()
    }

    /// Append each row's zero-based position as a trailing integer column.
    #[must_use]
    pub fn enumerate(rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter()
            .enumerate()
            .map(|(idx, mut row)| {
                row.values.push(Value::Integer(idx as i64));
                row
            })
            .collect()
    }
}
