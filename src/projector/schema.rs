//! Table schema derived from a mapping

use crate::mapping::Mapping;
use serde::{Deserialize, Serialize};

/// One column of a destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,
    /// Warehouse type tag, e.g. "STRING" or "INTEGER"
    #[serde(rename = "type")]
    pub column_type: String,
}

impl ColumnSchema {
    /// Create a column description
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Ordered list of columns handed to a sink so it can create the table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Columns in mapping order
    pub fields: Vec<ColumnSchema>,
}

impl SchemaDescriptor {
    /// Create a descriptor from columns
    pub fn new(fields: Vec<ColumnSchema>) -> Self {
        Self { fields }
    }

    /// Columns in order
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.fields
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.fields.iter().find(|c| c.name == name)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Derive the table schema: one column per field, in mapping order, with
/// names and types copied verbatim.
pub fn derive_schema<T: ?Sized>(mapping: &Mapping<T>) -> SchemaDescriptor {
    SchemaDescriptor::new(
        mapping
            .fields()
            .iter()
            .map(|field| ColumnSchema::new(field.name(), field.column_type()))
            .collect(),
    )
}
