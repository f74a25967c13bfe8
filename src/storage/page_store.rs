use std::sync::atomic::{AtomicUsize, Ordering};

use super::page::Page;
use crate::core::{EngineError, Row};

/// PageStore - immutable, page-organized row storage backing a `PagedTable`.
///
/// Rows are appended once at construction time and only ever read back by
/// a full scan, in insertion order.
#[derive(Debug)]
pub struct PageStore {
    pages: Vec<Page>,
    row_count: usize,
    page_size: usize,
    /// Full scans performed so far
    scans: AtomicUsize,
}

impl PageStore {
    /// Pack `rows` into pages of `page_size` bytes.
    pub fn build(rows: &[Row], page_size: usize) -> Result<Self, EngineError> {
        if page_size == 0 {
            return Err(EngineError::InvalidArgument("page size must be positive".to_string()));
        }

        let mut pages: Vec<Page> = Vec::new();
        let mut current = Page::new(0, page_size);

        for row in rows {
            let row_size = bincode::serialized_size(row)
                .map_err(|e| EngineError::BinarySerialization(e.to_string()))? as usize;

            if !current.can_fit(row_size) {
                let next = Page::new(pages.len() as u32 + 1, page_size);
                pages.push(std::mem::replace(&mut current, next));
            }
            current.insert_row(row)?;
        }

        if current.header.slot_count > 0 {
            pages.push(current);
        }

        log::trace!("Packed {} rows into {} pages", rows.len(), pages.len());

        Ok(Self {
            pages,
            row_count: rows.len(),
            page_size,
            scans: AtomicUsize::new(0),
        })
    }

    /// Decode every row of every page, in insertion order.
    pub fn scan(&self) -> Result<Vec<Row>, EngineError> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        let mut rows = Vec::with_capacity(self.row_count);
        for page in &self.pages {
            rows.extend(page.rows()?);
        }
        Ok(rows)
    }

    /// Number of full scans performed since construction.
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Rows physically stored, before any plan is applied.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }
}
