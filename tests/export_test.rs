// CSV export and size estimation
use std::fs;
use std::io::Write;

use tablescope::{Column, DataType, EngineConfig, ExportFormat, PagedTable, Row, RowTable, Table, Value};

fn people(n: i64) -> RowTable {
    let columns = vec![Column::new("id", DataType::Integer), Column::new("note", DataType::Text)];
    let rows = (0..n)
        .map(|i| Row::new(vec![Value::Integer(i), Value::Text(format!("row {i}, \"quoted\""))]))
        .collect();
    RowTable::with_rows(columns, rows).unwrap()
}

#[test]
fn test_export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let table = Table::from(people(3)).with_row_index();

    let mut file = fs::File::create(&path).unwrap();
    let bytes = table.to_csv(&mut file).unwrap();
    file.flush().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.len(), bytes);
    assert!(text.starts_with("id,note\n0,\"row 0, \"\"quoted\"\"\"\n"));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn test_estimate_close_to_actual() {
    let rows = people(5000);
    let paged = PagedTable::from_table(&rows).unwrap();
    for table in [Table::from(rows), Table::from(paged)] {
        let mut out = Vec::new();
        let actual = table.to_csv(&mut out).unwrap();
        let estimate = table.estimate_export_byte_size(ExportFormat::Csv).unwrap();
        let error = estimate.abs_diff(actual) as f64 / actual as f64;
        assert!(error < 0.1, "estimate {estimate} vs actual {actual}");
    }
}

#[test]
fn test_export_format_parsing() {
    assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    assert!("parquet".parse::<ExportFormat>().is_err());
}

#[test]
fn test_config_page_size_drives_storage() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[storage]\npage_size = 128").unwrap();
    let config = EngineConfig::load_from(Some(file.path()), Some(Default::default())).unwrap();

    let rows = people(50);
    let paged = PagedTable::from_rows(rows.columns.clone(), &rows.rows, config.storage.page_size).unwrap();
    assert!(paged.store().page_count() > 1);
    assert_eq!(Table::from(paged).size().unwrap(), 50);
}
