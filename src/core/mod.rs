// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod column;
pub mod row;
pub mod table;

// Re-exports for convenience
pub use error::EngineError;
pub use value::{Value, parse_timestamp};
pub use data_type::DataType;
pub use column::{Column, INDEX_COLUMN};
pub use row::Row;
pub use table::{RowTable, infer_column_type};
