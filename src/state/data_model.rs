use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde_json::Value;

pub type Row = BTreeMap<String, Value>;
pub type RecordId = String;

/// Field that supplies a record's identity when loading JSON rows.
pub const ID_FIELD: &str = "id";

/// One data item backing a table row.
///
/// Records are owned by whoever supplies them. The controller only reads
/// fields, and `is_valid` lets a source soft-delete a record that is still
/// present in an old row sequence.
pub trait Record: Clone + 'static {
    fn id(&self) -> RecordId;

    fn field(&self, key: &str) -> Option<&Value>;

    fn is_valid(&self) -> bool {
        true
    }
}

/// A record backed by a JSON object.
///
/// Clones share the validity flag, so invalidating a record through the
/// store is visible to every copy handed out earlier.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonRecord {
    id: RecordId,
    fields: Row,
    alive: Rc<Cell<bool>>,
}

impl JsonRecord {
    pub fn new(id: impl Into<RecordId>, fields: Row) -> Self {
        Self {
            id: id.into(),
            fields,
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Builds a record from a loaded row, using the `id` field when present
    /// and the row's position otherwise.
    pub fn from_row(row: Row, position: usize) -> Self {
        let id = row
            .get(ID_FIELD)
            .filter(|value| !value.is_null())
            .map(display_value)
            .unwrap_or_else(|| position.to_string());
        Self::new(id, row)
    }

    pub fn fields(&self) -> &Row {
        &self.fields
    }

    pub fn set_field(&mut self, key: &str, value: Value) -> bool {
        if self.fields.get(key) == Some(&value) {
            return false;
        }
        self.fields.insert(key.to_string(), value);
        true
    }

    pub fn invalidate(&self) {
        self.alive.set(false);
    }
}

impl Record for JsonRecord {
    fn id(&self) -> RecordId {
        self.id.clone()
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    fn is_valid(&self) -> bool {
        self.alive.get()
    }
}

pub fn records_from_rows(rows: Vec<Row>) -> Vec<JsonRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(position, row)| JsonRecord::from_row(row, position))
        .collect()
}

/// Returns the sorted union of all keys across all rows.
pub fn derive_columns(data: &[Row]) -> Vec<String> {
    let mut cols = BTreeSet::new();
    for row in data {
        for key in row.keys() {
            cols.insert(key.clone());
        }
    }
    cols.into_iter().collect()
}

/// Formats a JSON value for display in a table cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Turns raw text typed into a cell back into a JSON value.
pub fn parse_cell_input(input: &str) -> Value {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return Value::Number(number);
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(input.to_string()),
    }
}
