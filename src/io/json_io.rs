use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::state::data_model::Row;

#[derive(Debug, thiserror::Error)]
pub enum JsonIoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("JSON root is not an array")]
    NotAnArray,
    #[error("JSON array contains non-object elements")]
    NotArrayOfObjects,
}

/// Reads a dataset file: a JSON array of objects, one per record.
pub fn load_json(path: &Path) -> Result<Vec<Row>, JsonIoError> {
    let content = fs::read_to_string(path)?;
    parse_rows(&content)
}

pub fn parse_rows(content: &str) -> Result<Vec<Row>, JsonIoError> {
    let Value::Array(items) = serde_json::from_str(content)? else {
        return Err(JsonIoError::NotAnArray);
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(JsonIoError::NotArrayOfObjects),
        })
        .collect()
}
