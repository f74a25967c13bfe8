use std::io::Write;

use crate::core::{Column, EngineError, INDEX_COLUMN, Row, Value};

/// Write `rows` as CSV with a header line. The synthetic index column is
/// never exported. Returns the number of bytes written.
pub fn write_csv(columns: &[Column], rows: &[Row], writer: &mut dyn Write) -> Result<usize, EngineError> {
    let exported: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.name != INDEX_COLUMN)
        .map(|(idx, _)| idx)
        .collect();

    let header: Vec<String> = exported.iter().map(|&idx| columns[idx].name.clone()).collect();
    let mut written = write_csv_row(writer, &header)?;

    for row in rows {
        let cells: Vec<String> = exported.iter().map(|&idx| format_cell(row.get(idx))).collect();
        written += write_csv_row(writer, &cells)?;
    }

    Ok(written)
}

/// Size of the CSV lines for `rows`, header excluded, without keeping them.
pub fn csv_rows_size(columns: &[Column], rows: &[Row]) -> Result<usize, EngineError> {
    let total = write_csv(columns, rows, &mut std::io::sink())?;
    let header = write_csv(columns, &[], &mut std::io::sink())?;
    Ok(total - header)
}

fn write_csv_row(writer: &mut dyn Write, values: &[String]) -> Result<usize, EngineError> {
    let csv_line = values.iter().map(|v| escape_csv_value(v)).collect::<Vec<_>>().join(",");
    writeln!(writer, "{csv_line}")?;
    Ok(csv_line.len() + 1)
}

fn format_cell(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

fn escape_csv_value(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
