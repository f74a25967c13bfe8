/// Backend adapters - one implementation of the table operation set per
/// native table representation
///
/// Structure:
/// - memory: eager `RowTable`, every operation runs immediately
/// - paged: lazy `PagedTable`, operations extend a plan run on demand
/// - records: row to record conversion (native values or JSON primitives)
/// - csv: CSV writer used by export and export size estimation

pub mod csv;
pub mod memory;
pub mod paged;
pub mod records;

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::{Column, EngineError, Row, Value};
use crate::executor::{Aggregator, SortKey};
use crate::filter::Predicate;

pub use memory::MemoryBackend;
pub use paged::PagedBackend;
pub use records::{DEFAULT_MAX_STRING_CELL_LENGTH, JsonRecord, NativeRecord, RecordMode, Records};

/// Shared handle to a backend; every operation returns a fresh one.
pub type BackendRef = Arc<dyn TableBackend>;

/// Rows sampled when estimating export size.
pub const DEFAULT_EXPORT_SAMPLE_SIZE: usize = 500;

const ESTIMATE_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            other => Err(EngineError::InvalidArgument(format!("Unsupported export format: {other}"))),
        }
    }
}

/// Operation set every native table representation must provide.
///
/// Column positions passed in are always valid for `columns()`; name
/// resolution happens in the `Table` facade.
pub trait TableBackend: fmt::Debug + Send + Sync {
    /// Short name of the native representation.
    fn native_type(&self) -> &'static str;

    fn columns(&self) -> &[Column];

    /// Row count. Lazy backends may need a full scan.
    fn size(&self) -> Result<usize, EngineError>;

    /// Materialized rows, in table order.
    fn rows(&self) -> Result<Arc<Vec<Row>>, EngineError>;

    fn filter(&self, predicates: Vec<Predicate>) -> BackendRef;

    fn sort(&self, keys: Vec<SortKey>) -> BackendRef;

    /// Zero-based window; never wraps.
    fn paginate(&self, offset: usize, count: usize) -> BackendRef;

    fn sample(&self, n: usize, seed: Option<u64>) -> BackendRef;

    /// Projection, optionally renaming the projected columns.
    fn select(&self, indices: Vec<usize>, names: Option<Vec<String>>) -> BackendRef;

    /// Append a zero-based position column named `name`.
    fn with_row_index(&self, name: &str) -> BackendRef;

    /// Default cap for `distinct_values`.
    fn distinct_limit(&self) -> usize;

    /// Clone of the underlying native table.
    fn to_native(&self) -> Box<dyn Any + Send>;

    fn column_values(&self, index: usize) -> Result<Vec<Value>, EngineError> {
        Ok(self.rows()?.iter().map(|row| row.get(index).clone()).collect())
    }

    fn distinct_values(&self, index: usize, limit: usize) -> Result<Vec<Value>, EngineError> {
        let rows = self.rows()?;
        Ok(Aggregator::distinct(rows.iter().map(|row| row.get(index)), limit))
    }

    fn to_records(&self, mode: RecordMode, max_string_length: usize) -> Result<Records, EngineError> {
        let rows = self.rows()?;
        Ok(match mode {
            RecordMode::Native => Records::Native(records::native_records(self.columns(), &rows)),
            RecordMode::Json => Records::Json(records::json_records(self.columns(), &rows, max_string_length)),
        })
    }

    fn to_csv(&self, writer: &mut dyn std::io::Write) -> Result<usize, EngineError> {
        let rows = self.rows()?;
        csv::write_csv(self.columns(), &rows, writer)
    }

    /// Approximate export size from a seeded sample of `sample_size` rows.
    fn estimate_export_byte_size(&self, format: ExportFormat, sample_size: usize) -> Result<usize, EngineError> {
        let ExportFormat::Csv = format;
        let header = csv::write_csv(self.columns(), &[], &mut std::io::sink())?;
        let total = self.size()?;
        if total == 0 || sample_size == 0 {
            return Ok(header);
        }

        let sample = self.sample(sample_size, Some(ESTIMATE_SEED)).rows()?;
        if sample.is_empty() {
            return Ok(header);
        }
        let sampled = csv::csv_rows_size(self.columns(), &sample)?;
        let per_row = sampled as f64 / sample.len() as f64;
        Ok(header + (per_row * total as f64).round() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, RowTable};
    use crate::storage::PagedTable;

    fn table(n: i64) -> RowTable {
        let columns = vec![Column::new("id", DataType::Integer), Column::new("label", DataType::Text)];
        let rows = (0..n)
            .map(|i| Row::new(vec![Value::Integer(i), Value::Text("x".repeat((i % 7) as usize))]))
            .collect();
        RowTable::with_rows(columns, rows).unwrap()
    }

    fn backends(n: i64) -> Vec<BackendRef> {
        let memory = MemoryBackend::new(table(n));
        let paged = PagedBackend::new(PagedTable::from_table(&table(n)).unwrap());
        vec![Arc::new(memory), Arc::new(paged)]
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!("parquet".parse::<ExportFormat>(), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_estimate_is_exact_below_sample_size() {
        for backend in backends(100) {
            let mut out = Vec::new();
            let actual = backend.to_csv(&mut out).unwrap();
            let estimate = backend.estimate_export_byte_size(ExportFormat::Csv, 500).unwrap();
            assert_eq!(estimate, actual, "{}", backend.native_type());
        }
    }

    #[test]
    fn test_estimate_within_tolerance() {
        for backend in backends(5000) {
            let actual = backend.to_csv(&mut std::io::sink()).unwrap() as f64;
            let estimate = backend.estimate_export_byte_size(ExportFormat::Csv, 500).unwrap() as f64;
            assert!((estimate - actual).abs() / actual < 0.1, "{estimate} vs {actual}");
        }
    }

    #[test]
    fn test_backends_agree() {
        for backend in backends(20) {
            let page = backend.sort(vec![(0, false)]).paginate(2, 3);
            let ids: Vec<Value> = page.column_values(0).unwrap();
            assert_eq!(ids, vec![Value::Integer(17), Value::Integer(16), Value::Integer(15)]);

            assert_eq!(backend.distinct_values(1, 100).unwrap().len(), 7);
        }
    }
}
