/// Preview - cached view of a table under one set of filters and sort keys
///
/// A preview holds the first (or a seeded sample of) `max_records` rows of
/// the filtered and sorted source, as JSON records, plus the column
/// statistics of the full filtered table. Both are rebuilt only when the
/// requested filters, sort keys or color-scale columns change.
///
/// State machine: Uninitialized -> Ready on the first `update_if_needed`.
/// Every read before that is a `NotInitialized` error.

use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::{DisplayOptions, clamped_page_offset};
use crate::backend::JsonRecord;
use crate::core::{EngineError, INDEX_COLUMN};
use crate::filter::Filter;
use crate::stats::{ColumnStatsRecord, StatsBudget};
use crate::table::{SortBy, Table};

pub const DEFAULT_PREVIEW_RECORDS: usize = 1000;
pub const DEFAULT_PREVIEW_SEED: u64 = 42;

/// Dtype reported for the synthetic index column.
const INDEX_DTYPE: &str = "int";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// First rows of the sorted table
    #[default]
    Head,
    /// Seeded random sample of the sorted table
    Sampled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    pub max_records: usize,
    pub mode: PreviewMode,
    pub seed: u64,
    #[serde(skip)]
    pub display: DisplayOptions,
    #[serde(skip)]
    pub budget: StatsBudget,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_PREVIEW_RECORDS,
            mode: PreviewMode::Head,
            seed: DEFAULT_PREVIEW_SEED,
            display: DisplayOptions::default(),
            budget: StatsBudget::default(),
        }
    }
}

/// Cache key of a preview. Filters compare as a set, sort keys in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewKey {
    filters: Vec<Filter>,
    sort_by: Vec<SortBy>,
}

impl PreviewKey {
    #[must_use]
    pub fn new(filters: &[Filter], sort_by: &[SortBy]) -> Self {
        let mut filters = filters.to_vec();
        filters.sort_by_cached_key(Filter::canonical_key);
        filters.dedup();
        Self {
            filters,
            sort_by: sort_by.to_vec(),
        }
    }
}

#[derive(Debug)]
struct CachedStats {
    color_scale_columns: Vec<String>,
    records: Vec<ColumnStatsRecord>,
}

#[derive(Debug)]
struct Snapshot {
    key: PreviewKey,
    data: Vec<JsonRecord>,
    total_size: usize,
    processed: Table,
    stats: Option<CachedStats>,
}

#[derive(Debug)]
enum PreviewState {
    Uninitialized,
    Ready(Snapshot),
}

#[derive(Debug)]
pub struct Preview {
    source: Table,
    options: PreviewOptions,
    state: PreviewState,
    refreshes: usize,
    stats_runs: usize,
}

impl Preview {
    #[must_use]
    pub fn new(source: Table) -> Self {
        Self::with_options(source, PreviewOptions::default())
    }

    #[must_use]
    pub const fn with_options(source: Table, options: PreviewOptions) -> Self {
        Self {
            source,
            options,
            state: PreviewState::Uninitialized,
            refreshes: 0,
            stats_runs: 0,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &Table {
        &self.source
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        matches!(self.state, PreviewState::Ready(_))
    }

    /// Number of times the cached rows were rebuilt.
    #[must_use]
    pub const fn refresh_count(&self) -> usize {
        self.refreshes
    }

    /// Number of times column statistics were computed.
    #[must_use]
    pub const fn stats_count(&self) -> usize {
        self.stats_runs
    }

    /// True when the cached rows were built from these filters and sort keys.
    #[must_use]
    pub fn satisfies(&self, filters: &[Filter], sort_by: &[SortBy]) -> bool {
        match &self.state {
            PreviewState::Ready(snapshot) => snapshot.key == PreviewKey::new(filters, sort_by),
            PreviewState::Uninitialized => false,
        }
    }

    /// Rebuild the cached rows unless they already match. Returns whether a
    /// rebuild happened. Cached statistics are dropped on every rebuild.
    pub fn update_if_needed(&mut self, filters: &[Filter], sort_by: &[SortBy]) -> Result<bool, EngineError> {
        let key = PreviewKey::new(filters, sort_by);
        if matches!(&self.state, PreviewState::Ready(snapshot) if snapshot.key == key) {
            log::trace!("Preview already satisfies {} filters and {} sort keys", filters.len(), sort_by.len());
            return Ok(false);
        }

        let processed = self
            .source
            .prepare_for_serialization(self.options.display.max_columns)
            .filter(filters)
            .sort(sort_by);

        let window = match self.options.mode {
            PreviewMode::Sampled if self.options.max_records > 0 => {
                processed.sample(self.options.max_records, Some(self.options.seed))?
            }
            _ => processed.paginate(0, self.options.max_records),
        };

        let data = window
            .to_json_records(self.options.display.max_string_cell_length)?
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let mut indexed = Map::with_capacity(record.len() + 1);
                indexed.insert(INDEX_COLUMN.to_string(), index.into());
                indexed.extend(record);
                indexed
            })
            .collect();
        let total_size = processed.size()?;

        log::debug!("Preview rebuilt: {total_size} matching rows");
        self.state = PreviewState::Ready(Snapshot {
            key,
            data,
            total_size,
            processed,
            stats: None,
        });
        self.refreshes += 1;
        Ok(true)
    }

    fn snapshot(&self, action: &'static str) -> Result<&Snapshot, EngineError> {
        match &self.state {
            PreviewState::Ready(snapshot) => Ok(snapshot),
            PreviewState::Uninitialized => Err(EngineError::NotInitialized(action)),
        }
    }

    pub fn data(&self) -> Result<&[JsonRecord], EngineError> {
        Ok(self.snapshot("access data")?.data.as_slice())
    }

    /// Rows matching the current filters, not just the cached ones.
    pub fn total_size(&self) -> Result<usize, EngineError> {
        Ok(self.snapshot("access total size")?.total_size)
    }

    /// Filtered and sorted table the cached rows were taken from.
    pub fn processed(&self) -> Result<&Table, EngineError> {
        Ok(&self.snapshot("access processed table")?.processed)
    }

    /// Page of cached rows. Indices past the end give the last page.
    pub fn page(&self, page_index: i64, page_size: i64) -> Result<&[JsonRecord], EngineError> {
        let data = &self.snapshot("paginate data")?.data;
        let (offset, size) = clamped_page_offset(page_index, page_size, data.len())?;
        let end = offset.saturating_add(size).min(data.len());
        Ok(&data[offset.min(end)..end])
    }

    /// Column statistics of the processed table, led by the index column.
    /// Recomputed only when the color-scale column set changes.
    pub fn get_columns_stats(&mut self, color_scale_columns: &[String]) -> Result<&[ColumnStatsRecord], EngineError> {
        let mut requested = color_scale_columns.to_vec();
        requested.sort();
        requested.dedup();

        let budget = self.options.budget;
        let PreviewState::Ready(snapshot) = &mut self.state else {
            return Err(EngineError::NotInitialized("get column stats"));
        };

        let cached = snapshot
            .stats
            .as_ref()
            .is_some_and(|stats| stats.color_scale_columns == requested);
        if !cached {
            let mut records = vec![ColumnStatsRecord::new(INDEX_COLUMN, INDEX_DTYPE)];
            records.extend(snapshot.processed.analyze_columns(&requested, &budget)?);
            snapshot.stats = Some(CachedStats {
                color_scale_columns: requested,
                records,
            });
            self.stats_runs += 1;
        }

        Ok(snapshot.stats.as_ref().map(|stats| stats.records.as_slice()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType, Row, RowTable, Value};
    use crate::filter::FilterOperator;
    use crate::storage::PagedTable;
    use serde_json::json;

    fn source(rows: i64) -> RowTable {
        let columns = vec![Column::new("n", DataType::Integer), Column::new("parity", DataType::Text)];
        let rows = (0..rows)
            .map(|i| {
                let parity = if i % 2 == 0 { "even" } else { "odd" };
                Row::new(vec![Value::Integer(i), Value::Text(parity.to_string())])
            })
            .collect();
        RowTable::with_rows(columns, rows).unwrap()
    }

    fn odd_filter() -> Vec<Filter> {
        vec![Filter::new("parity", FilterOperator::IsEqual, vec![json!("odd")])]
    }

    #[test]
    fn test_reads_before_update_fail() {
        let mut preview = Preview::new(Table::from(source(3)));
        assert!(!preview.is_initialized());
        assert!(matches!(preview.data(), Err(EngineError::NotInitialized(_))));
        assert!(matches!(preview.total_size(), Err(EngineError::NotInitialized(_))));
        assert!(matches!(preview.page(0, 10), Err(EngineError::NotInitialized(_))));
        assert!(matches!(preview.get_columns_stats(&[]), Err(EngineError::NotInitialized(_))));
    }

    #[test]
    fn test_update_is_idempotent() {
        let paged = PagedTable::from_table(&source(20)).unwrap();
        let mut preview = Preview::new(Table::from(paged.clone()));
        let sort = vec![("n".to_string(), false)];

        assert!(preview.update_if_needed(&odd_filter(), &sort).unwrap());
        let scans = paged.store().scan_count();
        assert!(!preview.update_if_needed(&odd_filter(), &sort).unwrap());

        assert_eq!(preview.refresh_count(), 1);
        assert_eq!(paged.store().scan_count(), scans);
        assert_eq!(preview.total_size().unwrap(), 10);
        assert_eq!(preview.data().unwrap()[0]["n"], json!(19));
    }

    #[test]
    fn test_filter_order_does_not_matter() {
        let mut preview = Preview::new(Table::from(source(10)));
        let a = Filter::new("n", FilterOperator::GreaterThan, vec![json!(2)]);
        let b = Filter::new("parity", FilterOperator::IsEqual, vec![json!("odd")]);

        preview.update_if_needed(&[a.clone(), b.clone()], &[]).unwrap();
        assert!(preview.satisfies(&[b.clone(), a.clone()], &[]));
        assert!(!preview.update_if_needed(&[b, a], &[]).unwrap());
        assert!(!preview.satisfies(&[], &[("n".to_string(), true)]));
    }

    #[test]
    fn test_records_lead_with_index() {
        let mut preview = Preview::new(Table::from(source(4)));
        preview.update_if_needed(&odd_filter(), &[]).unwrap();
        let data = preview.data().unwrap();
        let keys: Vec<&String> = data[0].keys().collect();
        assert_eq!(keys, vec![INDEX_COLUMN, "n", "parity"]);
        assert_eq!(data[1][INDEX_COLUMN], json!(1));
        assert_eq!(data[1]["n"], json!(3));
    }

    #[test]
    fn test_page_bounds() {
        let mut preview = Preview::new(Table::from(source(25)));
        preview.update_if_needed(&[], &[]).unwrap();

        assert_eq!(preview.page(0, 10).unwrap().len(), 10);
        let last = preview.page(99, 10).unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last[0]["n"], json!(20));
        assert!(matches!(preview.page(-1, 10), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(preview.page(0, 0), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_max_records_and_sampling() {
        let options = PreviewOptions {
            max_records: 5,
            mode: PreviewMode::Sampled,
            ..PreviewOptions::default()
        };
        let mut preview = Preview::with_options(Table::from(source(100)), options.clone());
        preview.update_if_needed(&[], &[]).unwrap();
        assert_eq!(preview.data().unwrap().len(), 5);
        assert_eq!(preview.total_size().unwrap(), 100);

        let mut again = Preview::with_options(Table::from(source(100)), options);
        again.update_if_needed(&[], &[]).unwrap();
        assert_eq!(preview.data().unwrap(), again.data().unwrap());
    }

    #[test]
    fn test_column_stats_cache() {
        let mut preview = Preview::new(Table::from(source(6)));
        preview.update_if_needed(&[], &[]).unwrap();

        let stats = preview.get_columns_stats(&[]).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].name, INDEX_COLUMN);
        assert_eq!(stats[0].dtype, "int");
        assert!(stats[0].stats.is_none());
        assert!(stats[1].stats.is_some());

        preview.get_columns_stats(&[]).unwrap();
        assert_eq!(preview.stats_count(), 1);
        preview.get_columns_stats(&["n".to_string()]).unwrap();
        assert_eq!(preview.stats_count(), 2);
        preview.get_columns_stats(&["n".to_string(), "n".to_string()]).unwrap();
        assert_eq!(preview.stats_count(), 2);

        // a rebuild drops cached stats
        preview.update_if_needed(&odd_filter(), &[]).unwrap();
        preview.get_columns_stats(&["n".to_string()]).unwrap();
        assert_eq!(preview.stats_count(), 3);
    }
}
