// JSON records for every value type
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tablescope::{Column, DataType, RecordMode, Row, RowTable, Table, Value};

fn every_type() -> RowTable {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let cells = vec![
        (DataType::SmallInt, Value::SmallInt(-3)),
        (DataType::Integer, Value::Integer(i64::MAX)),
        (DataType::Real, Value::Real(f64::NEG_INFINITY)),
        (DataType::Numeric { precision: 10, scale: 2 }, Value::Numeric(Decimal::new(12_345, 2))),
        (DataType::Text, Value::Text("x".repeat(5000))),
        (DataType::Categorical, Value::Text("cat".to_string())),
        (DataType::Boolean, Value::Boolean(true)),
        (DataType::Date, Value::Date(date)),
        (DataType::Timestamp, Value::Timestamp(date.and_hms_opt(12, 30, 0).unwrap())),
        (DataType::TimestampTz, Value::TimestampTz(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
        (DataType::Duration, Value::Duration(90_000_000)),
        (DataType::Uuid, Value::Uuid(uuid::Uuid::nil())),
        (DataType::Json, Value::Json(r#"{"a": 1}"#.to_string())),
        (DataType::Bytea, Value::Bytea(vec![0, 159, 146, 150, 255])),
        (DataType::List, Value::List(vec![Value::Integer(1), Value::Null])),
        (DataType::Map, Value::Map(vec![("k".to_string(), Value::Boolean(false))])),
        (
            DataType::Struct { fields: vec!["a".to_string()] },
            Value::Struct(vec![("a".to_string(), Value::Real(f64::NAN))]),
        ),
        (DataType::Object, Value::Object("<object at 0x1>".to_string())),
        (DataType::Real, Value::Null),
    ];

    let columns = cells
        .iter()
        .enumerate()
        .map(|(idx, (data_type, _))| Column::new(format!("c{idx}"), data_type.clone()))
        .collect();
    let row = Row::new(cells.into_iter().map(|(_, value)| value).collect());
    RowTable::with_rows(columns, vec![row]).unwrap()
}

#[test]
fn test_every_type_encodes() {
    let table = Table::from(every_type());
    for mode in [RecordMode::Json, RecordMode::Native] {
        let records = table.to_records(mode).unwrap().into_json();
        let text = serde_json::to_string(&records).unwrap();
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back.as_array().map(Vec::len), Some(1));
    }
}

#[test]
fn test_json_record_values() {
    let records = Table::from(every_type()).to_json_records(100).unwrap();
    let record = &records[0];

    assert_eq!(record["c0"], serde_json::json!(-3));
    assert_eq!(record["c2"], serde_json::json!("-inf"));
    assert_eq!(record["c4"].as_str().map(|s| s.chars().count()), Some(100));
    assert_eq!(record["c6"], serde_json::json!(true));
    assert_eq!(record["c7"], serde_json::json!("2024-02-29"));
    assert!(record["c13"].is_string());
    assert!(record["c18"].is_null());
}

#[test]
fn test_json_records_file_round_trip() {
    let records: Vec<serde_json::Value> = serde_json::from_str(
        r#"[{"id": 1, "name": "ann", "score": 1.5}, {"id": 2, "name": null, "score": 3}]"#,
    )
    .unwrap();
    let rows = RowTable::from_json_records(&records).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.columns[0].data_type, DataType::Integer);

    let out = Table::from(rows).to_json_records(1000).unwrap();
    assert_eq!(out[0]["name"], serde_json::json!("ann"));
    assert!(out[1]["name"].is_null());
}
