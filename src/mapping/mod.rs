//! Mapping module
//!
//! Declares the shape of one destination table.
//!
//! # Overview
//!
//! The mapping module provides:
//! - `FieldSpec` - One output column with its type and extractor
//! - `FieldExtractor` - Trait for computing a column value from a record
//! - `PathExtractor` - Declarative extractor for JSON records
//! - `Mapping` - Ordered, duplicate-free collection of fields

mod field;
mod path;

pub use field::{FieldExtractor, FieldSpec};
pub use path::PathExtractor;

use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::HashSet;
use std::fmt;

/// Ordered collection of output fields for one table
///
/// Field names are unique and field order determines column order.
pub struct Mapping<T: ?Sized> {
    fields: Vec<FieldSpec<T>>,
}

impl<T: ?Sized> Mapping<T> {
    /// Build a mapping from fields, rejecting duplicate names
    pub fn new(fields: impl IntoIterator<Item = FieldSpec<T>>) -> Result<Self> {
        let fields: Vec<FieldSpec<T>> = fields.into_iter().collect();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(Error::DuplicateField {
                    name: field.name().to_string(),
                });
            }
        }

        Ok(Self { fields })
    }

    /// A mapping with no columns
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Start building a mapping field by field
    pub fn builder() -> MappingBuilder<T> {
        MappingBuilder { fields: Vec::new() }
    }

    /// Fields in column order
    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldSpec::name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the mapping has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T: ?Sized> Clone for Mapping<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Mapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

/// Builder for [`Mapping`]
pub struct MappingBuilder<T: ?Sized> {
    fields: Vec<FieldSpec<T>>,
}

impl<T: ?Sized> MappingBuilder<T> {
    /// Add a field computed by a fallible function
    #[must_use]
    pub fn field<F>(mut self, name: impl Into<String>, column_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<JsonValue> + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec::new(name, column_type, f));
        self
    }

    /// Add a field computed by a function that cannot fail
    #[must_use]
    pub fn infallible<F>(
        mut self,
        name: impl Into<String>,
        column_type: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(&T) -> JsonValue + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec::infallible(name, column_type, f));
        self
    }

    /// Add a prebuilt field
    #[must_use]
    pub fn spec(mut self, field: FieldSpec<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish the mapping, rejecting duplicate names
    pub fn build(self) -> Result<Mapping<T>> {
        Mapping::new(self.fields)
    }
}

#[cfg(test)]
mod tests;
