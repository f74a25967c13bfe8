// tablescope - backend-polymorphic table browsing engine
// Filters, multi-key sort, paging, budgeted column statistics, cached previews

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_inception)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

// Values, types, columns, rows and the eager row table
pub mod core;

// Filter model, wire parsing and compiled predicates
pub mod filter;

// Row-level sort/slice/sample helpers and aggregates
pub mod executor;

// Paged storage (pages of bincode rows, lazy plans)
pub mod storage;

// Backend adapters (memory, paged), JSON records, CSV
pub mod backend;

// Column statistics engine
pub mod stats;

// Table facade over any backend
pub mod table;

// Browse requests, previews and pages
pub mod browse;

// Engine configuration (file, environment)
pub mod config;

// Re-export commonly used types for convenience
pub use backend::{ExportFormat, JsonRecord, RecordMode, Records, TableBackend};
pub use browse::{BrowseResult, BrowseSpec, DisplayOptions, OutputType, Preview, PreviewMode, PreviewOptions, browse_table};
pub use config::EngineConfig;
pub use core::{Column, DataType, EngineError, INDEX_COLUMN, Row, RowTable, Value};
pub use filter::{Filter, FilterOperator};
pub use stats::{ColumnStats, ColumnStatsRecord, StatsBudget};
pub use storage::PagedTable;
pub use table::{SortBy, Table};
