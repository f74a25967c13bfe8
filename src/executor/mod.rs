/// Executor module - row operators applied by the table backends
///
/// Structure:
/// - rows: filter, stable multi-key sort, slice, seeded sample, projection
/// - aggregate: MIN/MAX and DISTINCT over column values

pub mod aggregate;
pub mod rows;

pub use aggregate::Aggregator;
pub use rows::{RowExecutor, SortKey};
