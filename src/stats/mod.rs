/// Column statistics engine
///
/// Per column: distinct and missing counts, then either min/max plus a
/// histogram (numbers, timestamps, durations) or a top-values breakdown
/// (everything else). Work is bounded by a rows x columns budget; columns
/// past the budget get no stats at all.
///
/// Structure:
/// - analyze: budgeted driver over a backend
/// - histogram: fixed-count equal-width bins
/// - categories: top values, "others" and "Missing" buckets

pub mod analyze;
pub mod categories;
pub mod histogram;

use serde::{Deserialize, Serialize};

pub use analyze::{analyze_column, analyze_columns};

pub const DEFAULT_MAX_CELLS: usize = 10_000_000;
pub const DEFAULT_COLOR_SCALE_MAX_CELLS: usize = 1_000_000;
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub count: usize,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Summary of one column. Color-scale-only columns carry counts and
/// `min`/`max`, with no histogram or categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub unique_count: usize,
    pub nan_count: usize,
    pub min: Option<String>,
    pub max: Option<String>,
    pub histogram: Option<Vec<HistogramBin>>,
    pub categories: Option<Vec<Category>>,
}

/// Column metadata sent with every browse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatsRecord {
    pub name: String,
    pub dtype: String,
    pub stats: Option<ColumnStats>,
}

impl ColumnStatsRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
            stats: None,
        }
    }
}

/// Computation limits for one `analyze_columns` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsBudget {
    /// Rows x analyzed columns allowed for full statistics
    pub max_cells: usize,
    /// Rows x columns allowed for color-scale min/max past `max_cells`
    pub color_scale_max_cells: usize,
    pub histogram_bins: usize,
}

impl Default for StatsBudget {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
            color_scale_max_cells: DEFAULT_COLOR_SCALE_MAX_CELLS,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_record_serialization() {
        let mut record = ColumnStatsRecord::new("a", "int64");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"name": "a", "dtype": "int64", "stats": null})
        );

        record.stats = Some(ColumnStats {
            unique_count: 5,
            min: Some("1".to_string()),
            max: Some("5".to_string()),
            ..ColumnStats::default()
        });
        assert_eq!(
            serde_json::to_value(&record).unwrap()["stats"],
            json!({"unique_count": 5, "nan_count": 0, "min": "1", "max": "5", "histogram": null, "categories": null})
        );
    }

    #[test]
    fn test_budget_defaults() {
        let budget: StatsBudget = serde_json::from_value(json!({"max_cells": 5})).unwrap();
        assert_eq!(budget.max_cells, 5);
        assert_eq!(budget.color_scale_max_cells, DEFAULT_COLOR_SCALE_MAX_CELLS);
        assert_eq!(budget.histogram_bins, 10);
    }
}
