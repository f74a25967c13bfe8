use serde_json::Value as JsonValue;

use crate::core::EngineError;
use crate::filter::Filter;
use crate::table::SortBy;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_PAGE_INDEX: i64 = 0;

const COLOR_SCALE_RULE: &str = "colorScale";

/// Parsed browse request.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseSpec {
    /// Column searches followed by conditional filters
    pub filters: Vec<Filter>,
    pub sort_by: Vec<SortBy>,
    pub page_size: i64,
    pub page_index: i64,
    pub cell_formatting_rules: Vec<JsonValue>,
    /// Columns some color-scale formatting rule applies to, in table order
    pub color_scale_column_names: Vec<String>,
}

impl Default for BrowseSpec {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort_by: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            page_index: DEFAULT_PAGE_INDEX,
            cell_formatting_rules: Vec::new(),
            color_scale_column_names: Vec::new(),
        }
    }
}

impl BrowseSpec {
    /// Parse a browse request against the table's column names. A missing
    /// request means defaults everywhere.
    ///
    /// Sort keys on unknown columns are dropped so a request can be reused
    /// across tables; a malformed sort key or an unknown sort direction is
    /// an error.
    pub fn from_json(spec: Option<&str>, column_names: &[String]) -> Result<Self, EngineError> {
        let spec: JsonValue = match spec {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(text)?,
            _ => return Ok(Self::default()),
        };
        let spec = spec
            .as_object()
            .ok_or_else(|| EngineError::InvalidAttributes(format!("expected an object, got {spec}")))?;

        let mut filters = Vec::new();
        for key in ["filters", "conditionalFilters"] {
            for raw in array_field(spec.get(key), key)? {
                filters.push(Filter::parse(raw)?);
            }
        }

        let mut sort_by = Vec::new();
        for raw in array_field(spec.get("sortBy"), "sortBy")? {
            if let Some(key) = parse_sort_by(raw, column_names)? {
                sort_by.push(key);
            }
        }

        let cell_formatting_rules = array_field(spec.get("cellFormattingRules"), "cellFormattingRules")?.to_vec();
        let color_scale_column_names = color_scale_columns(&cell_formatting_rules, column_names);

        Ok(Self {
            filters,
            sort_by,
            page_size: int_field(spec.get("pageSize"), "pageSize", DEFAULT_PAGE_SIZE)?,
            page_index: int_field(spec.get("pageIndex"), "pageIndex", DEFAULT_PAGE_INDEX)?,
            cell_formatting_rules,
            color_scale_column_names,
        })
    }
}

fn array_field<'a>(value: Option<&'a JsonValue>, name: &str) -> Result<&'a [JsonValue], EngineError> {
    match value {
        None | Some(JsonValue::Null) => Ok(Default::default()),
        Some(JsonValue::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(EngineError::InvalidAttributes(format!("{name} must be an array, got {other}"))),
    }
}

fn int_field(value: Option<&JsonValue>, name: &str, default: i64) -> Result<i64, EngineError> {
    match value {
        None | Some(JsonValue::Null) => Ok(default),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| EngineError::InvalidAttributes(format!("{name} must be an integer, got {value}"))),
    }
}

fn parse_sort_by(raw: &JsonValue, column_names: &[String]) -> Result<Option<SortBy>, EngineError> {
    let (Some(id), Some(direction)) = (
        raw.get("id").filter(|v| !v.is_null()),
        raw.get("type").filter(|v| !v.is_null()),
    ) else {
        return Err(EngineError::InvalidAttributes("Invalid attributes given".to_string()));
    };

    let column = crate::filter::json_to_string(id);
    if !column_names.contains(&column) {
        return Ok(None);
    }

    match direction.as_str() {
        Some("asc") => Ok(Some((column, true))),
        Some("desc") => Ok(Some((column, false))),
        _ => Err(EngineError::InvalidAttributes("Invalid sort by type given".to_string())),
    }
}

/// Columns selected by color-scale rules. Rules with an unknown selection
/// mode select nothing; names not in the table are ignored.
fn color_scale_columns(rules: &[JsonValue], column_names: &[String]) -> Vec<String> {
    let mut selected = vec![false; column_names.len()];

    for rule in rules {
        if rule.get("type").and_then(JsonValue::as_str) != Some(COLOR_SCALE_RULE) {
            continue;
        }
        let listed: Vec<&str> = rule
            .get("columnNames")
            .and_then(JsonValue::as_array)
            .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default();

        let mode = rule.get("columnSelectionMode").and_then(JsonValue::as_str);
        for (flag, name) in selected.iter_mut().zip(column_names) {
            *flag |= match mode {
                Some("all") => true,
                Some("allExcept") => !listed.contains(&name.as_str()),
                Some("only") => listed.contains(&name.as_str()),
                _ => false,
            };
        }
    }

    let mut names: Vec<String> = Vec::new();
    for (name, keep) in column_names.iter().zip(selected) {
        if keep && !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}
