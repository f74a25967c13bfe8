use std::sync::{Arc, OnceLock, Weak};

use super::page::PAGE_SIZE;
use super::page_store::PageStore;
use crate::core::{Column, DataType, EngineError, Row, RowTable};
use crate::executor::{RowExecutor, SortKey};
use crate::filter::Predicate;

type Memo = OnceLock<Arc<Vec<Row>>>;

/// One deferred operation of a `PagedTable` plan.
#[derive(Debug, Clone)]
pub enum PlanStep {
    Filter(Vec<Predicate>),
    Sort(Vec<SortKey>),
    Slice { offset: usize, count: usize },
    Sample { n: usize, seed: Option<u64> },
    Select(Vec<usize>),
    /// Append a zero-based position column
    RowIndex,
}

/// PagedTable - lazy table over page storage.
///
/// Operations never touch the pages; they return a new table whose plan
/// has one more step. The plan runs on the first call that needs rows
/// (`collect`, `count`) and its result is kept for every later call on the
/// same table value. A derived table whose ancestor is still alive and
/// already materialized starts from the ancestor's rows instead of the pages.
#[derive(Debug, Clone)]
pub struct PagedTable {
    store: Arc<PageStore>,
    columns: Vec<Column>,
    plan: Vec<PlanStep>,
    materialized: Arc<Memo>,
    /// Ancestor memos, oldest first, with the plan length each one ran
    lineage: Vec<(usize, Weak<Memo>)>,
}

impl PagedTable {
    /// Store `rows` in pages of `page_size` bytes.
    pub fn from_rows(columns: Vec<Column>, rows: &[Row], page_size: usize) -> Result<Self, EngineError> {
        if let Some(row) = rows.iter().find(|row| row.values.len() != columns.len()) {
            return Err(EngineError::ColumnCountMismatch {
                expected: columns.len(),
                actual: row.values.len(),
            });
        }
        let store = PageStore::build(rows, page_size)?;
        Ok(Self {
            store: Arc::new(store),
            columns,
            plan: Vec::new(),
            materialized: Arc::new(OnceLock::new()),
            lineage: Vec::new(),
        })
    }

    /// Copy an eager table into page storage with the default page size.
    pub fn from_table(table: &RowTable) -> Result<Self, EngineError> {
        Self::from_rows(table.columns.clone(), &table.rows, PAGE_SIZE)
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn plan(&self) -> &[PlanStep] {
        &self.plan
    }

    /// Shared page storage, also reachable from every derived table.
    #[must_use]
    pub fn store(&self) -> &PageStore {
        &self.store
    }

    fn with_step(&self, step: PlanStep, columns: Vec<Column>) -> Self {
        let mut plan = self.plan.clone();
        plan.push(step);
        let mut lineage = self.lineage.clone();
        lineage.push((self.plan.len(), Arc::downgrade(&self.materialized)));
        Self {
            store: Arc::clone(&self.store),
            columns,
            plan,
            materialized: Arc::new(OnceLock::new()),
            lineage,
        }
    }

    #[must_use]
    pub fn filter(&self, predicates: Vec<Predicate>) -> Self {
        if predicates.is_empty() {
            return self.clone();
        }
        self.with_step(PlanStep::Filter(predicates), self.columns.clone())
    }

    #[must_use]
    pub fn sort(&self, keys: Vec<SortKey>) -> Self {
        if keys.is_empty() {
            return self.clone();
        }
        self.with_step(PlanStep::Sort(keys), self.columns.clone())
    }

    #[must_use]
    pub fn slice(&self, offset: usize, count: usize) -> Self {
        self.with_step(PlanStep::Slice { offset, count }, self.columns.clone())
    }

    #[must_use]
    pub fn sample(&self, n: usize, seed: Option<u64>) -> Self {
        self.with_step(PlanStep::Sample { n, seed }, self.columns.clone())
    }

    /// Project onto `indices`, optionally renaming the projected columns.
    #[must_use]
    pub fn select(&self, indices: Vec<usize>, names: Option<Vec<String>>) -> Self {
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
        self.with_step(PlanStep::Select(indices), columns)
    }

    #[must_use]
    pub fn with_row_index(&self, name: &str) -> Self {
        let mut columns = self.columns.clone();
        columns.push(Column::new(name, DataType::Integer));
        self.with_step(PlanStep::RowIndex, columns)
    }

    /// Run the plan, or return the rows of an earlier run.
    pub fn collect(&self) -> Result<Arc<Vec<Row>>, EngineError> {
        if let Some(rows) = self.materialized.get() {
            log::trace!("Reusing materialized rows for plan of {} steps", self.plan.len());
            return Ok(Arc::clone(rows));
        }
        let rows = Arc::new(self.execute()?);
        Ok(Arc::clone(self.materialized.get_or_init(|| rows)))
    }

    /// Row count after the plan. Requires a full scan the first time.
    pub fn count(&self) -> Result<usize, EngineError> {
        if self.plan.is_empty() {
            return Ok(self.store.row_count());
        }
        Ok(self.collect()?.len())
    }

    /// Rows of the nearest materialized ancestor and the steps it covers.
    fn ancestor_rows(&self) -> Option<(usize, Arc<Vec<Row>>)> {
        self.lineage
            .iter()
            .rev()
            .find_map(|(steps, memo)| Some((*steps, Arc::clone(memo.upgrade()?.get()?))))
    }

    fn execute(&self) -> Result<Vec<Row>, EngineError> {
        let (done, mut rows) = match self.ancestor_rows() {
            Some((steps, rows)) => {
                log::debug!(
                    "Resuming plan of {} steps from a materialized ancestor at step {steps}",
                    self.plan.len()
                );
                (steps, rows.as_ref().clone())
            }
            None => {
                log::debug!(
                    "Scanning {} pages to run a plan of {} steps",
                    self.store.page_count(),
                    self.plan.len()
                );
                (0, self.store.scan()?)
            }
        };
        for step in &self.plan[done..] {
            rows = match step {
                PlanStep::Filter(predicates) => RowExecutor::filter(rows, predicates),
                PlanStep::Sort(keys) => {
                    RowExecutor::sort(&mut rows, keys);
                    rows
                }
                PlanStep::Slice { offset, count } => RowExecutor::slice(rows, *offset, *count),
                PlanStep::Sample { n, seed } => RowExecutor::sample(rows, *n, *seed),
                PlanStep::Select(indices) => RowExecutor::select(rows, indices),
                PlanStep::RowIndex => RowExecutor::enumerate(rows),
            };
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::filter::{Filter, FilterOperator, compile_filters};
    use chrono::Utc;
    use serde_json::json;

    fn table() -> PagedTable {
        let columns = vec![
            Column::new("id", DataType::Integer),
            Column::new("name", DataType::Text),
        ];
        let rows: Vec<Row> = ["carol", "alice", "dave", "bob"]
            .iter()
            .enumerate()
            .map(|(i, name)| Row::new(vec![Value::Integer(i as i64), Value::Text((*name).to_string())]))
            .collect();
        PagedTable::from_rows(columns, &rows, 64).unwrap()
    }

    #[test]
    fn test_operations_are_deferred() {
        let base = table();
        let sorted = base.sort(vec![(1, true)]).slice(0, 2);

        assert_eq!(sorted.plan().len(), 2);
        assert_eq!(base.store().scan_count(), 0);

        let rows = sorted.collect().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(1), &Value::Text("alice".to_string()));
        assert_eq!(rows[1].get(1), &Value::Text("bob".to_string()));
        assert_eq!(base.store().scan_count(), 1);
    }

    #[test]
    fn test_plan_result_is_memoized() {
        let sorted = table().sort(vec![(0, false)]);
        sorted.collect().unwrap();
        sorted.count().unwrap();
        sorted.clone().collect().unwrap();
        assert_eq!(sorted.store().scan_count(), 1);
    }

    #[test]
    fn test_derived_plan_resumes_from_materialized_parent() {
        let base = table();
        let sorted = base.sort(vec![(1, true)]);
        assert_eq!(sorted.count().unwrap(), 4);
        assert_eq!(base.store().scan_count(), 1);

        let page = sorted.slice(1, 2);
        let rows = page.collect().unwrap();
        assert_eq!(rows[0].get(1), &Value::Text("bob".to_string()));
        assert_eq!(rows[1].get(1), &Value::Text("carol".to_string()));
        assert_eq!(base.store().scan_count(), 1);

        // grandchild skips the unmaterialized middle table
        let deeper = sorted.slice(0, 3).slice(2, 1);
        assert_eq!(deeper.collect().unwrap()[0].get(1), &Value::Text("carol".to_string()));
        assert_eq!(base.store().scan_count(), 1);
    }

    #[test]
    fn test_dropped_parent_falls_back_to_scan() {
        let base = table();
        let page = {
            let sorted = base.sort(vec![(0, false)]);
            sorted.collect().unwrap();
            sorted.slice(0, 1)
        };
        assert_eq!(page.collect().unwrap()[0].get(0), &Value::Integer(3));
        assert_eq!(base.store().scan_count(), 2);
    }

    #[test]
    fn test_count_without_plan_skips_scan() {
        let base = table();
        assert_eq!(base.count().unwrap(), 4);
        assert_eq!(base.store().scan_count(), 0);
    }

    #[test]
    fn test_filter_and_row_index() {
        let base = table();
        let filters = [Filter::new("name", FilterOperator::TextContains, vec![json!("a")])];
        let predicates = compile_filters(&filters, base.columns(), Utc::now());
        let indexed = base.with_row_index("pos").filter(predicates);

        assert_eq!(indexed.columns().len(), 3);
        let rows = indexed.collect().unwrap();
        let positions: Vec<&Value> = rows.iter().map(|r| r.get(2)).collect();
        assert_eq!(positions, vec![&Value::Integer(0), &Value::Integer(1), &Value::Integer(2)]);
    }

    #[test]
    fn test_select_renames() {
        let projected = table().select(vec![1], Some(vec!["who".to_string()]));
        assert_eq!(projected.columns()[0].name, "who");
        assert_eq!(projected.collect().unwrap()[0].values, vec![Value::Text("carol".to_string())]);
    }

    #[test]
    fn test_column_count_mismatch() {
        let result = PagedTable::from_rows(
            vec![Column::new("a", DataType::Integer)],
            &[Row::new(vec![Value::Integer(1), Value::Integer(2)])],
            PAGE_SIZE,
        );
        assert!(matches!(result, Err(EngineError::ColumnCountMismatch { expected: 1, actual: 2 })));
    }
}
