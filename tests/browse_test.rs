// Browse pipeline over both backends
use serde_json::json;
use tablescope::{
    BrowseSpec, Column, DataType, DisplayOptions, INDEX_COLUMN, OutputType, PagedTable, Preview, PreviewMode,
    PreviewOptions, RowTable, Table, Value, browse_table,
};

fn sample_rows() -> RowTable {
    let column = |name: &str, values: [i64; 4]| -> (Column, Vec<Value>) {
        (Column::new(name, DataType::Integer), values.into_iter().map(Value::Integer).collect())
    };
    RowTable::from_columns(vec![
        column("col1", [1214, 2456, 2431, 1354]),
        column("col2", [4534, 135, 135, 43_676_548]),
        column("col3", [32, 756, 32, 0]),
        column("col4", [46, 9, 467, 846]),
    ])
    .unwrap()
}

fn tables() -> Vec<Table> {
    let rows = sample_rows();
    vec![
        Table::from(rows.clone()),
        Table::from(PagedTable::from_rows(rows.columns.clone(), &rows.rows, 64).unwrap()),
    ]
}

const FILTER_SPEC: &str = r#"{
    "pageSize": 1,
    "pageIndex": 0,
    "filters": [{"id": "col1", "value": "24", "type": "contains"}],
    "conditionalFilters": [{"column": "col3", "operator": "greater-than", "comparativeValues": [500]}]
}"#;

#[test]
fn test_filtered_page_on_every_backend() {
    for table in tables() {
        let spec = BrowseSpec::from_json(Some(FILTER_SPEC), &table.column_names()).unwrap();
        let result = browse_table(&table, &spec, None, &DisplayOptions::default()).unwrap();

        assert_eq!(result.output_type, OutputType::Dataframe, "{}", table.native_type());
        assert_eq!(result.row_count, 1);
        assert_eq!(
            serde_json::Value::Object(result.rows[0].clone()),
            json!({"col1": 2456, "col2": 135, "col3": 756, "col4": 9, INDEX_COLUMN: 1})
        );
    }
}

#[test]
fn test_sorted_pages_cover_table() {
    for table in tables() {
        let spec = BrowseSpec::from_json(
            Some(r#"{"pageSize": 3, "sortBy": [{"id": "col2", "type": "asc"}, {"id": "col4", "type": "desc"}]}"#),
            &table.column_names(),
        )
        .unwrap();
        let first = browse_table(&table, &spec, None, &DisplayOptions::default()).unwrap();
        let order: Vec<_> = first.rows.iter().map(|r| r["col4"].clone()).collect();
        assert_eq!(order, vec![json!(467), json!(9), json!(46)]);

        let last = BrowseSpec { page_index: 5, ..spec };
        let result = browse_table(&table, &last, None, &DisplayOptions::default()).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["col4"], json!(846));
        assert_eq!(result.rows[0][INDEX_COLUMN], json!(3));
    }
}

#[test]
fn test_preview_recomputes_once_per_request() {
    let rows = sample_rows();
    let paged = PagedTable::from_table(&rows).unwrap();
    let table = Table::from(paged.clone());
    let mut preview = Preview::new(table.clone());
    let spec = BrowseSpec::from_json(Some(FILTER_SPEC), &table.column_names()).unwrap();

    let first = browse_table(&table, &spec, Some(&mut preview), &DisplayOptions::default()).unwrap();
    let scans = paged.store().scan_count();
    let second = browse_table(&table, &spec, Some(&mut preview), &DisplayOptions::default()).unwrap();

    assert_eq!(preview.refresh_count(), 1);
    assert_eq!(paged.store().scan_count(), scans);
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.output_type, OutputType::DataPreview);
    assert_eq!(first.rows[0][INDEX_COLUMN], json!(0));
    assert_eq!(first.rows[0]["col1"], json!(2456));
}

#[test]
fn test_sampled_preview_is_bounded() {
    let values = (0..200).map(Value::Integer).collect();
    let table = Table::from(RowTable::from_columns(vec![(Column::new("n", DataType::Integer), values)]).unwrap());
    let options = PreviewOptions {
        max_records: 20,
        mode: PreviewMode::Sampled,
        ..PreviewOptions::default()
    };
    let mut preview = Preview::with_options(table.clone(), options);
    let spec = BrowseSpec {
        page_size: 50,
        ..BrowseSpec::default()
    };

    let result = browse_table(&table, &spec, Some(&mut preview), &DisplayOptions::default()).unwrap();
    assert_eq!(result.rows.len(), 20);
    assert_eq!(result.row_count, 200);
    assert_eq!(result.preview_row_count, 20);
}

#[test]
fn test_duplicate_names_are_browsable() {
    let table = Table::from(
        RowTable::from_columns(vec![
            (Column::new("x", DataType::Integer), vec![Value::Integer(1)]),
            (Column::new("x", DataType::Text), vec![Value::Text("a".to_string())]),
        ])
        .unwrap(),
    );
    let result = browse_table(&table, &BrowseSpec::default(), None, &DisplayOptions::default()).unwrap();
    let keys: Vec<&String> = result.rows[0].keys().collect();
    assert_eq!(keys, vec!["x", "x.1", INDEX_COLUMN]);
}
