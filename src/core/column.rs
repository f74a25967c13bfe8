use serde::{Deserialize, Serialize};
use super::data_type::DataType;

/// Name of the synthetic row-identity column added to browsed tables.
pub const INDEX_COLUMN: &str = "_tablescope_index";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Type tag reported to the frontend, e.g. `int64`.
    #[must_use]
    pub fn declared_type(&self) -> String {
        self.data_type.type_tag()
    }
}
