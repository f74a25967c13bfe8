/// Browse layer - turns a browse request into a page of JSON rows
///
/// Structure:
/// - spec: request parsing (`BrowseSpec`)
/// - preview: cached filtered/sorted view with its column statistics
/// - browse: `browse_table`, the request entry point

pub mod browse;
pub mod preview;
pub mod spec;

use serde::{Deserialize, Serialize};

use crate::backend::DEFAULT_MAX_STRING_CELL_LENGTH;
use crate::core::EngineError;

pub use browse::{BrowseResult, OutputType, browse_table};
pub use preview::{Preview, PreviewKey, PreviewMode, PreviewOptions};
pub use spec::BrowseSpec;

pub const DEFAULT_MAX_COLUMNS: usize = 500;

/// Limits applied to everything sent to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub max_columns: usize,
    pub max_string_cell_length: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            max_string_cell_length: DEFAULT_MAX_STRING_CELL_LENGTH,
        }
    }
}

/// Start offset of page `page_index` out of `total` rows, clamped to the
/// last page. Negative indices and non-positive sizes are rejected.
pub fn clamped_page_offset(page_index: i64, page_size: i64, total: usize) -> Result<(usize, usize), EngineError> {
    if page_index < 0 || page_size < 1 {
        return Err(EngineError::InvalidArgument(
            "page_index must be non-negative and page_size must be positive".to_string(),
        ));
    }
    let size = usize::try_from(page_size).unwrap_or(usize::MAX);
    let index = usize::try_from(page_index).unwrap_or(usize::MAX);
    let total_pages = total.div_ceil(size);
    let index = if total_pages > 0 { index.min(total_pages - 1) } else { 0 };
    Ok((index.saturating_mul(size), size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_page_offset() {
        assert_eq!(clamped_page_offset(0, 10, 25).unwrap(), (0, 10));
        assert_eq!(clamped_page_offset(2, 10, 25).unwrap(), (20, 10));
        assert_eq!(clamped_page_offset(7, 10, 25).unwrap(), (20, 10));
        assert_eq!(clamped_page_offset(3, 10, 0).unwrap(), (0, 10));
    }

    #[test]
    fn test_clamped_page_offset_rejects_bad_input() {
        assert!(clamped_page_offset(-1, 10, 25).is_err());
        assert!(clamped_page_offset(0, 0, 25).is_err());
        assert!(clamped_page_offset(0, -3, 25).is_err());
    }
}
