use std::collections::HashMap;

use super::Category;
use crate::core::Value;

/// Named value buckets before the rest is folded into "others".
pub const TOP_CATEGORIES: usize = 3;

pub const MISSING_CATEGORY: &str = "Missing";

/// Top values by descending frequency (ties keep first-seen order), one
/// "`k` others" bucket for the `k` remaining distinct values and a final
/// "Missing" bucket when `missing > 0`.
///
/// Values are grouped by canonical string, so lists and maps are counted
/// like any other value.
#[must_use]
pub fn categories<'a>(values: impl IntoIterator<Item = &'a Value>, missing: usize) -> Vec<Category> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        let key = value.grouping_key();
        match positions.get(&key) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let others = counts.split_off(counts.len().min(TOP_CATEGORIES));
    let mut categories: Vec<Category> = counts
        .into_iter()
        .map(|(name, count)| Category::new(name, count))
        .collect();

    if !others.is_empty() {
        let count = others.iter().map(|(_, count)| count).sum();
        categories.push(Category::new(format!("{} others", others.len()), count));
    }
    if missing > 0 {
        categories.push(Category::new(MISSING_CATEGORY, missing));
    }
    categories
}
