use serde::Serialize;

use super::preview::Preview;
use super::spec::BrowseSpec;
use super::{DisplayOptions, clamped_page_offset};
use crate::backend::JsonRecord;
use crate::core::EngineError;
use crate::table::Table;

/// How the frontend should render a browse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Dataframe,
    DataPreview,
}

#[derive(Debug, Clone)]
pub struct BrowseResult {
    /// Table after name cleanup, row index, filters and sort
    pub processed: Table,
    /// Requested page as JSON records
    pub rows: Vec<JsonRecord>,
    /// Rows matching the filters
    pub row_count: usize,
    /// Rows the page was cut from: the whole table, or the preview's cache
    pub preview_row_count: usize,
    pub output_type: OutputType,
}

/// Apply a browse request to `table`.
///
/// With a `preview`, pages come from its cache, rebuilt only when filters
/// or sort keys change. Without one, the table is filtered and sorted on
/// every call and the page index is clamped to the last page.
pub fn browse_table(
    table: &Table,
    spec: &BrowseSpec,
    preview: Option<&mut Preview>,
    display: &DisplayOptions,
) -> Result<BrowseResult, EngineError> {
    if preview.is_none() && table.size()? == 0 {
        return Ok(BrowseResult {
            processed: table.clone(),
            rows: Vec::new(),
            row_count: 0,
            preview_row_count: 0,
            output_type: OutputType::Dataframe,
        });
    }

    if let Some(preview) = preview {
        preview.update_if_needed(&spec.filters, &spec.sort_by)?;
        let rows = preview.page(spec.page_index, spec.page_size)?.to_vec();
        return Ok(BrowseResult {
            processed: preview.processed()?.clone(),
            rows,
            row_count: preview.total_size()?,
            preview_row_count: preview.data()?.len(),
            output_type: OutputType::DataPreview,
        });
    }

    let processed = table
        .prepare_for_serialization(display.max_columns)
        .with_row_index()
        .filter(&spec.filters)
        .sort(&spec.sort_by);
    let row_count = processed.size()?;
    let (offset, size) = clamped_page_offset(spec.page_index, spec.page_size, row_count)?;
    let rows = processed
        .paginate(offset, size)
        .to_json_records(display.max_string_cell_length)?;

    Ok(BrowseResult {
        processed,
        rows,
        row_count,
        preview_row_count: row_count,
        output_type: OutputType::Dataframe,
    })
}
