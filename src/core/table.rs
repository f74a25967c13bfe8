use serde::{Deserialize, Serialize};
use super::column::Column;
use super::data_type::DataType;
use super::error::EngineError;
use super::row::Row;
use super::value::Value;

/// Eager in-memory table: a schema plus fully materialized rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl RowTable {
    #[must_use]
    pub const fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self, EngineError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    /// Build a table column by column. All columns must have the same length.
    pub fn from_columns(columns: Vec<(Column, Vec<Value>)>) -> Result<Self, EngineError> {
        let len = columns.first().map_or(0, |(_, values)| values.len());
        if let Some((column, values)) = columns.iter().find(|(_, values)| values.len() != len) {
            return Err(EngineError::InvalidArgument(format!(
                "column '{}' has {} values, expected {len}",
                column.name,
                values.len()
            )));
        }

        let mut rows: Vec<Row> = (0..len).map(|_| Row::new(Vec::with_capacity(columns.len()))).collect();
        let mut schema = Vec::with_capacity(columns.len());
        for (column, values) in columns {
            for (row, value) in rows.iter_mut().zip(values) {
                row.values.push(value);
            }
            schema.push(column);
        }
        Ok(Self { columns: schema, rows })
    }

    /// Build a table from an array of flat JSON objects. Columns appear in
    /// first-seen key order and their types are inferred from the values.
    pub fn from_json_records(records: &[serde_json::Value]) -> Result<Self, EngineError> {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            let object = record.as_object().ok_or_else(|| {
                EngineError::InvalidArgument(format!("expected a JSON object per record, got {record}"))
            })?;
            for key in object.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let rows: Vec<Row> = records
            .iter()
            .map(|record| {
                Row::new(
                    names
                        .iter()
                        .map(|name| record.get(name).map_or(Value::Null, Value::from_json))
                        .collect(),
                )
            })
            .collect();

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let data_type = infer_column_type(rows.iter().map(|row| row.get(idx)));
                Column::new(name, data_type)
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn insert(&mut self, row: Row) -> Result<(), EngineError> {
        if row.values.len() != self.columns.len() {
            return Err(EngineError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: row.values.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Position of the first column with the given name.
    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    #[must_use]
    pub fn column_values(&self, index: usize) -> Vec<Value> {
        self.rows.iter().map(|row| row.get(index).clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Narrowest declared type holding every non-null value. Columns without
/// any value are reported as opaque objects.
pub fn infer_column_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    values
        .filter_map(Value::inferred_type)
        .reduce(DataType::unify)
        .unwrap_or(DataType::Object)
}
