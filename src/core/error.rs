use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid attributes given: {0}")]
    InvalidAttributes(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unsupported table type: expected RowTable or PagedTable, got {0}")]
    UnsupportedBackend(String),
    #[error("Cannot {0}: preview is not initialized")]
    NotInitialized(&'static str),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Column count mismatch: expected {expected}, got {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },
    #[error("Type mismatch")]
    TypeMismatch,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Binary Serialization error: {0}")]
    BinarySerialization(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
