use std::collections::HashSet;

use super::categories::categories;
use super::histogram::histogram;
use super::{ColumnStats, ColumnStatsRecord, StatsBudget};
use crate::backend::TableBackend;
use crate::core::{DataType, EngineError, INDEX_COLUMN, Value};
use crate::executor::Aggregator;

/// Present (non-missing) values with the distinct and missing counts.
fn presence(values: &[Value]) -> (Vec<&Value>, usize, usize) {
    let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    let nan_count = values.len() - present.len();
    let unique_count = present
        .iter()
        .map(|v| v.grouping_key())
        .collect::<HashSet<_>>()
        .len();
    (present, unique_count, nan_count)
}

/// Full statistics for one column of values.
#[must_use]
pub fn analyze_column(values: &[Value], data_type: &DataType, histogram_bins: usize) -> ColumnStats {
    let (present, unique_count, nan_count) = presence(values);
    let mut stats = ColumnStats {
        unique_count,
        nan_count,
        ..ColumnStats::default()
    };

    if data_type.is_orderable() && !present.is_empty() {
        match Aggregator::min_max(present.iter().copied()) {
            Ok(extremes) => {
                stats.min = extremes.map(|(min, _)| min.to_string());
                stats.max = extremes.map(|(_, max)| max.to_string());
            }
            Err(e) => log::warn!("Skipping min/max of a {data_type} column: {e}"),
        }
        let points: Vec<f64> = present.iter().filter_map(|v| v.ordinal()).collect();
        stats.histogram = histogram(&points, histogram_bins);
    } else {
        stats.categories = Some(categories(present.iter().copied(), nan_count));
    }

    stats
}

/// Statistics for every column of `backend`, within `budget`.
///
/// Columns are analyzed left to right while rows x analyzed columns stays
/// within `max_cells`; the first column that would exceed it, and every
/// column after it, gets no statistics. Of those, numeric, temporal and
/// duration columns named in `color_scale_columns` still get counts and
/// min/max while `color_scale_max_cells` lasts. The synthetic index column is listed but never analyzed.
pub fn analyze_columns(
    backend: &dyn TableBackend,
    color_scale_columns: &[String],
    budget: &StatsBudget,
) -> Result<Vec<ColumnStatsRecord>, EngineError> {
    let rows = backend.size()?;
    let columns = backend.columns();
    let mut records: Vec<ColumnStatsRecord> = columns
        .iter()
        .map(|column| ColumnStatsRecord::new(column.name.clone(), column.declared_type()))
        .collect();

    let mut analyzed = 0usize;
    let mut skipped = Vec::new();
    for (idx, column) in columns.iter().enumerate() {
        if column.name == INDEX_COLUMN {
            continue;
        }
        if skipped.is_empty() && rows.saturating_mul(analyzed + 1) <= budget.max_cells {
            let values = backend.column_values(idx)?;
            records[idx].stats = Some(analyze_column(&values, &column.data_type, budget.histogram_bins));
            analyzed += 1;
        } else {
            skipped.push(idx);
        }
    }

    if skipped.is_empty() {
        return Ok(records);
    }
    log::debug!(
        "Stats budget of {} cells reached after {analyzed} columns of {rows} rows",
        budget.max_cells
    );

    let mut remaining = budget.color_scale_max_cells;
    for idx in skipped {
        let column = &columns[idx];
        if !column.data_type.is_orderable() || !color_scale_columns.contains(&column.name) {
            continue;
        }
        if rows > remaining {
            log::debug!("Color scale budget exhausted at column '{}'", column.name);
            break;
        }
        remaining -= rows;

        let values = backend.column_values(idx)?;
        let (present, unique_count, nan_count) = presence(&values);
        let mut stats = ColumnStats {
            unique_count,
            nan_count,
            ..ColumnStats::default()
        };
        match Aggregator::min_max(present.iter().copied()) {
            Ok(extremes) => {
                stats.min = extremes.map(|(min, _)| min.to_string());
                stats.max = extremes.map(|(_, max)| max.to_string());
            }
            Err(e) => log::warn!("Skipping color scale range of '{}': {e}", column.name),
        }
        records[idx].stats = Some(stats);
    }

    Ok(records)
}
