use std::any::Any;
use std::sync::Arc;

use super::{BackendRef, TableBackend};
use crate::core::{Column, EngineError, Row};
use crate::executor::SortKey;
use crate::filter::Predicate;
use crate::storage::PagedTable;

/// Distinct values returned per column unless a limit is given. Kept low
/// since every distinct query runs the whole plan.
pub const PAGED_DISTINCT_LIMIT: usize = 100;

/// Lazy backend over a `PagedTable`. Operations only extend the table's
/// plan; rows are produced when `size`, `rows` or an export asks for them.
#[derive(Debug, Clone)]
pub struct PagedBackend {
    table: PagedTable,
}

impl PagedBackend {
    #[must_use]
    pub const fn new(table: PagedTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub const fn table(&self) -> &PagedTable {
        &self.table
    }

    fn wrap(table: PagedTable) -> BackendRef {
        Arc::new(Self { table })
    }
}

impl TableBackend for PagedBackend {
    fn native_type(&self) -> &'static str {
        "paged"
    }

    fn columns(&self) -> &[Column] {
        self.table.columns()
    }

    fn size(&self) -> Result<usize, EngineError> {
        self.table.count()
    }

    fn rows(&self) -> Result<Arc<Vec<Row>>, EngineError> {
        self.table.collect()
    }

    fn filter(&self, predicates: Vec<Predicate>) -> BackendRef {
        Self::wrap(self.table.filter(predicates))
    }

    fn sort(&self, keys: Vec<SortKey>) -> BackendRef {
        Self::wrap(self.table.sort(keys))
    }

    fn paginate(&self, offset: usize, count: usize) -> BackendRef {
        Self::wrap(self.table.slice(offset, count))
    }

    fn sample(&self, n: usize, seed: Option<u64>) -> BackendRef {
        Self::wrap(self.table.sample(n, seed))
    }

    fn select(&self, indices: Vec<usize>, names: Option<Vec<String>>) -> BackendRef {
        Self::wrap(self.table.select(indices, names))
    }

    fn with_row_index(&self, name: &str) -> BackendRef {
        Self::wrap(self.table.with_row_index(name))
    }

    fn distinct_limit(&self) -> usize {
        PAGED_DISTINCT_LIMIT
    }

    fn to_native(&self) -> Box<dyn Any + Send> {
        Box::new(self.table.clone())
    }
}
