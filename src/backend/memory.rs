use std::any::Any;
use std::sync::Arc;

use super::{BackendRef, TableBackend};
use crate::core::{Column, DataType, EngineError, Row, RowTable};
use crate::executor::{RowExecutor, SortKey};
use crate::filter::Predicate;

/// Distinct values returned per column unless a limit is given.
pub const MEMORY_DISTINCT_LIMIT: usize = 1000;

/// Eager backend over an in-memory `RowTable`. Every operation runs right
/// away and produces a new row vector; the source rows are shared, never
/// mutated.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    columns: Vec<Column>,
    rows: Arc<Vec<Row>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(table: RowTable) -> Self {
        Self {
            columns: table.columns,
            rows: Arc::new(table.rows),
        }
    }

    fn derive(&self, columns: Vec<Column>, rows: Vec<Row>) -> BackendRef {
        Arc::new(Self {
            columns,
            rows: Arc::new(rows),
        })
    }

    fn derive_rows(&self, rows: Vec<Row>) -> BackendRef {
        self.derive(self.columns.clone(), rows)
    }

    fn cloned_rows(&self) -> Vec<Row> {
        self.rows.as_ref().clone()
    }
}

impl TableBackend for MemoryBackend {
    fn native_type(&self) -> &'static str {
        "memory"
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn size(&self) -> Result<usize, EngineError> {
        Ok(self.rows.len())
    }

    fn rows(&self) -> Result<Arc<Vec<Row>>, EngineError> {
        Ok(Arc::clone(&self.rows))
    }

    fn filter(&self, predicates: Vec<Predicate>) -> BackendRef {
        if predicates.is_empty() {
            return Arc::new(self.clone());
        }
        let rows = self
            .rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .cloned()
            .collect();
        self.derive_rows(rows)
    }

    fn sort(&self, keys: Vec<SortKey>) -> BackendRef {
        let mut rows = self.cloned_rows();
        RowExecutor::sort(&mut rows, &keys);
        self.derive_rows(rows)
    }

    fn paginate(&self, offset: usize, count: usize) -> BackendRef {
        let rows = self.rows.iter().skip(offset).take(count).cloned().collect();
        self.derive_rows(rows)
    }

    fn sample(&self, n: usize, seed: Option<u64>) -> BackendRef {
        self.derive_rows(RowExecutor::sample(self.cloned_rows(), n, seed))
    }

    fn select(&self, indices: Vec<usize>, names: Option<Vec<String>>) -> BackendRef {
        let columns = indices
            .iter()
            .enumerate()
            .filter_map(|(pos, &idx)| {
                let mut column = self.columns.get(idx)?.clone();
                if let Some(name) = names.as_ref().and_then(|names| names.get(pos)) {
                    column.name.clone_from(name);
                }
                Some(column)
            })
            .collect();
        let rows = RowExecutor::select(self.cloned_rows(), &indices);
        self.derive(columns, rows)
    }

    fn with_row_index(&self, name: &str) -> BackendRef {
        let mut columns = self.columns.clone();
        columns.push(Column::new(name, DataType::Integer));
        self.derive(columns, RowExecutor::enumerate(self.cloned_rows()))
    }

    fn distinct_limit(&self) -> usize {
        MEMORY_DISTINCT_LIMIT
    }

    fn to_native(&self) -> Box<dyn Any + Send> {
        Box::new(RowTable {
            columns: self.columns.clone(),
            rows: self.cloned_rows(),
        })
    }
}
