//! Decoding of serialized engine rows

use crate::error::{EngineError, Result};
use explorer_types::Row;
use serde_json::Value;

/// Parses each serialized row into a column map
pub fn decode_rows(raw: &[String]) -> Result<Vec<Row>> {
    raw.iter().map(|text| decode_row(text)).collect()
}

fn decode_row(text: &str) -> Result<Row> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(row) => Ok(row),
        other => Err(EngineError::Storage(format!(
            "expected a row object, got {}",
            other
        ))),
    }
}

/// Reads an integer column, accepting numbers and numeric strings
pub fn integer_column(row: &Row, column: &str) -> Option<u64> {
    match row.get(column)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim_end_matches('n').parse().ok(),
        _ => None,
    }
}

/// Reads a boolean column
pub fn bool_column(row: &Row, column: &str) -> Option<bool> {
    match row.get(column)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|v| v != 0),
        _ => None,
    }
}
