//! Output rows

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// One output row: column name to value, in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: JsonObject,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` columns
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: JsonObject::with_capacity(capacity),
        }
    }

    /// Set a column value, returning the previous one
    pub fn set(&mut self, column: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.values.insert(column.into(), value)
    }

    /// Get a column value
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.values.get(column)
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// (column, value) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert into a JSON object
    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.values)
    }
}

impl From<JsonObject> for Row {
    fn from(values: JsonObject) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, JsonValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
