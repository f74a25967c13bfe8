use serde::{Deserialize, Serialize};
use crate::core::{EngineError, Row};

/// Default page size (8 KB)
pub const PAGE_SIZE: usize = 8192;

/// Slot - points to a row within a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Offset from start of page data
    pub offset: u32,
    /// Length of the row in bytes
    pub length: u32,
}

/// Page Header - metadata about the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageHeader {
    /// Position of the page within its store
    pub page_number: u32,
    /// Bytes this page may hold before it is considered full
    pub capacity: u32,
    /// Number of rows stored
    pub slot_count: u16,
}

/// Page - append-only unit of row storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page header
    pub header: PageHeader,
    /// Slots pointing to rows
    pub slots: Vec<Slot>,
    /// Serialized rows, back to back
    pub data: Vec<u8>,
}

impl Page {
    /// Create a new empty page
    #[must_use]
    pub fn new(page_number: u32, capacity: usize) -> Self {
        Self {
            header: PageHeader {
                page_number,
                capacity: capacity as u32,
                slot_count: 0,
            },
            slots: Vec::new(),
            data: Vec::with_capacity(capacity),
        }
    }

    /// Get available free space
    #[must_use]
    pub fn free_space(&self) -> usize {
        (self.header.capacity as usize).saturating_sub(self.data.len())
    }

    /// Can this page fit a row of given size? An empty page accepts any
    /// single row, so oversized rows get a page of their own.
    #[must_use]
    pub fn can_fit(&self, row_size: usize) -> bool {
        self.slots.is_empty() || (self.free_space() >= row_size && self.slots.len() < usize::from(u16::MAX))
    }

    /// Insert a row into this page
    pub fn insert_row(&mut self, row: &Row) -> Result<u16, EngineError> {
        let row_bytes = bincode::serialize(row)
            .map_err(|e| EngineError::BinarySerialization(e.to_string()))?;

        if !self.can_fit(row_bytes.len()) {
            return Err(EngineError::Io(std::io::Error::other("Page is full")));
        }

        let slot = Slot {
            offset: self.data.len() as u32,
            length: row_bytes.len() as u32,
        };
        self.data.extend_from_slice(&row_bytes);

        let slot_index = self.slots.len() as u16;
        self.slots.push(slot);
        self.header.slot_count += 1;

        Ok(slot_index)
    }

    /// Get a row by slot index
    pub fn get_row(&self, slot_index: u16) -> Result<Row, EngineError> {
        let slot = self.slots.get(slot_index as usize)
            .ok_or_else(|| EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Invalid slot index",
            )))?;

        let offset = slot.offset as usize;
        let length = slot.length as usize;
        let row_bytes = &self.data[offset..offset + length];

        bincode::deserialize(row_bytes)
            .map_err(|e| EngineError::BinarySerialization(e.to_string()))
    }

    /// Decode every row in slot order
    pub fn rows(&self) -> Result<Vec<Row>, EngineError> {
        (0..self.header.slot_count).map(|idx| self.get_row(idx)).collect()
    }
}
