/// Table facade - one entry point over every backend
///
/// A `Table` wraps a `TableBackend` and resolves column names, filters and
/// sort keys before handing positions to it. Every operation returns a new
/// `Table`; the wrapped native table is never modified.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::{
    BackendRef, DEFAULT_EXPORT_SAMPLE_SIZE, DEFAULT_MAX_STRING_CELL_LENGTH, ExportFormat, JsonRecord,
    MemoryBackend, PagedBackend, RecordMode, Records, TableBackend,
};
use crate::core::{Column, EngineError, INDEX_COLUMN, RowTable, Value};
use crate::filter::{Filter, compile_filters};
use crate::stats::{ColumnStatsRecord, StatsBudget, analyze_columns};
use crate::storage::PagedTable;

/// Sort request by column name: `(column, ascending)`.
pub type SortBy = (String, bool);

#[derive(Debug, Clone)]
pub struct Table {
    backend: BackendRef,
}

impl Table {
    #[must_use]
    pub fn from_backend(backend: BackendRef) -> Self {
        Self { backend }
    }

    /// Wrap a native table. Only `RowTable` and `PagedTable` are supported.
    pub fn from_native<T: Any>(native: T) -> Result<Self, EngineError> {
        let native: Box<dyn Any> = Box::new(native);
        let native = match native.downcast::<RowTable>() {
            Ok(table) => return Ok(Self::from(*table)),
            Err(other) => other,
        };
        match native.downcast::<PagedTable>() {
            Ok(table) => Ok(Self::from(*table)),
            Err(_) => Err(EngineError::UnsupportedBackend(type_name::<T>().to_string())),
        }
    }

    /// True when `from_native` would accept a value of this type.
    #[must_use]
    pub fn is_supported<T: Any>(_native: &T) -> bool {
        let id = TypeId::of::<T>();
        id == TypeId::of::<RowTable>() || id == TypeId::of::<PagedTable>()
    }

    /// Clone of the wrapped native table, for the caller to downcast.
    #[must_use]
    pub fn to_native(&self) -> Box<dyn Any + Send> {
        self.backend.to_native()
    }

    #[must_use]
    pub fn native_type(&self) -> &'static str {
        self.backend.native_type()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        self.backend.columns()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name.clone()).collect()
    }

    /// Position of the first column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name == name)
    }

    pub fn size(&self) -> Result<usize, EngineError> {
        self.backend.size()
    }

    /// Stable sort by the given keys. Keys naming unknown columns are
    /// ignored; no usable key leaves the order untouched.
    #[must_use]
    pub fn sort(&self, sort_by: &[SortBy]) -> Self {
        let keys: Vec<_> = sort_by
            .iter()
            .filter_map(|(name, ascending)| {
                let index = self.column_index(name);
                if index.is_none() {
                    log::debug!("Dropping sort key on unknown column '{name}'");
                }
                index.map(|idx| (idx, *ascending))
            })
            .collect();
        if keys.is_empty() {
            return self.clone();
        }
        Self::from_backend(self.backend.sort(keys))
    }

    /// Keep rows matching every applicable filter, evaluating relative
    /// dates against the current time.
    #[must_use]
    pub fn filter(&self, filters: &[Filter]) -> Self {
        self.filter_at(filters, Utc::now())
    }

    #[must_use]
    pub fn filter_at(&self, filters: &[Filter], now: DateTime<Utc>) -> Self {
        let predicates = compile_filters(filters, self.columns(), now);
        if predicates.is_empty() {
            return self.clone();
        }
        Self::from_backend(self.backend.filter(predicates))
    }

    /// Zero-based window of at most `count` rows. Never wraps.
    #[must_use]
    pub fn paginate(&self, offset: usize, count: usize) -> Self {
        Self::from_backend(self.backend.paginate(offset, count))
    }

    /// At most `n` random rows in table order, reproducible for a seed.
    pub fn sample(&self, n: usize, seed: Option<u64>) -> Result<Self, EngineError> {
        if n < 1 {
            return Err(EngineError::InvalidArgument("n must be positive".to_string()));
        }
        Ok(Self::from_backend(self.backend.sample(n, seed)))
    }

    /// Append the synthetic zero-based row index column.
    #[must_use]
    pub fn with_row_index(&self) -> Self {
        Self::from_backend(self.backend.with_row_index(INDEX_COLUMN))
    }

    pub fn to_records(&self, mode: RecordMode) -> Result<Records, EngineError> {
        self.backend.to_records(mode, DEFAULT_MAX_STRING_CELL_LENGTH)
    }

    pub fn to_json_records(&self, max_string_length: usize) -> Result<Vec<JsonRecord>, EngineError> {
        Ok(self.backend.to_records(RecordMode::Json, max_string_length)?.into_json())
    }

    /// Write all rows as CSV, without the synthetic index column.
    pub fn to_csv(&self, writer: &mut dyn Write) -> Result<usize, EngineError> {
        self.backend.to_csv(writer)
    }

    pub fn estimate_export_byte_size(&self, format: ExportFormat) -> Result<usize, EngineError> {
        self.backend.estimate_export_byte_size(format, DEFAULT_EXPORT_SAMPLE_SIZE)
    }

    pub fn estimate_export_byte_size_with(&self, format: ExportFormat, sample_size: usize) -> Result<usize, EngineError> {
        self.backend.estimate_export_byte_size(format, sample_size)
    }

    pub fn analyze_columns(
        &self,
        color_scale_columns: &[String],
        budget: &StatsBudget,
    ) -> Result<Vec<ColumnStatsRecord>, EngineError> {
        analyze_columns(self.backend.as_ref(), color_scale_columns, budget)
    }

    /// Distinct non-null values per requested column, at most `limit` each
    /// (the backend's own cap when `None`).
    pub fn distinct_values(
        &self,
        columns: &[&str],
        limit: Option<usize>,
    ) -> Result<Vec<(String, Vec<Value>)>, EngineError> {
        let limit = limit.unwrap_or_else(|| self.backend.distinct_limit());
        columns
            .iter()
            .map(|&name| -> Result<_, EngineError> {
                let index = self
                    .column_index(name)
                    .ok_or_else(|| EngineError::ColumnNotFound(name.to_string()))?;
                Ok((name.to_string(), self.backend.distinct_values(index, limit)?))
            })
            .collect()
    }

    /// Make column names unique (`a`, `a.1`, `a.2`) and keep at most
    /// `max_columns` columns.
    #[must_use]
    pub fn prepare_for_serialization(&self, max_columns: usize) -> Self {
        let names = deduplicate_names(self.columns().iter().map(|c| c.name.as_str()));
        let kept = names.len().min(max_columns);
        let renamed = names.iter().zip(self.columns()).any(|(name, column)| *name != column.name);

        if !renamed && kept == names.len() {
            return self.clone();
        }
        let names = names.into_iter().take(kept).collect();
        Self::from_backend(self.backend.select((0..kept).collect(), Some(names)))
    }
}

impl From<RowTable> for Table {
    fn from(table: RowTable) -> Self {
        Self::from_backend(Arc::new(MemoryBackend::new(table)))
    }
}

impl From<PagedTable> for Table {
    fn from(table: PagedTable) -> Self {
        Self::from_backend(Arc::new(PagedBackend::new(table)))
    }
}

/// Suffix repeated names with `.1`, `.2`, ... skipping suffixes that are
/// already taken.
fn deduplicate_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .map(|name| {
            let mut name = name.to_string();
            let mut seen = counts.get(&name).copied().unwrap_or(0);
            while seen > 0 {
                counts.insert(name.clone(), seen + 1);
                name = format!("{name}.{seen}");
                seen = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), seen + 1);
            name
        })
        .collect()
}
