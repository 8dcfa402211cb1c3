//! Field specifications and extractors

use crate::types::JsonValue;
use std::fmt;
use std::sync::Arc;

/// Computes one column value from an input record
///
/// Implementations must be pure with respect to shared state: they may be
/// invoked concurrently from several threads, once per record per field.
pub trait FieldExtractor<T: ?Sized>: Send + Sync {
    /// Extract the column value from a record
    fn extract(&self, record: &T) -> anyhow::Result<JsonValue>;
}

impl<T: ?Sized, F> FieldExtractor<T> for F
where
    F: Fn(&T) -> anyhow::Result<JsonValue> + Send + Sync,
{
    fn extract(&self, record: &T) -> anyhow::Result<JsonValue> {
        self(record)
    }
}

/// Adapter for extraction functions that cannot fail
struct Infallible<F>(F);

impl<T: ?Sized, F> FieldExtractor<T> for Infallible<F>
where
    F: Fn(&T) -> JsonValue + Send + Sync,
{
    fn extract(&self, record: &T) -> anyhow::Result<JsonValue> {
        Ok((self.0)(record))
    }
}

/// One output column: its name, warehouse type tag, and how to compute it
pub struct FieldSpec<T: ?Sized> {
    name: String,
    column_type: String,
    extractor: Arc<dyn FieldExtractor<T>>,
}

impl<T: ?Sized> FieldSpec<T> {
    /// Create a field from a fallible extraction function
    pub fn new<F>(name: impl Into<String>, column_type: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<JsonValue> + Send + Sync + 'static,
    {
        Self::with_extractor(name, column_type, extract)
    }

    /// Create a field from an extraction function that cannot fail
    pub fn infallible<F>(name: impl Into<String>, column_type: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&T) -> JsonValue + Send + Sync + 'static,
    {
        Self::with_extractor(name, column_type, Infallible(extract))
    }

    /// Create a field from any extractor implementation
    pub fn with_extractor<E>(
        name: impl Into<String>,
        column_type: impl Into<String>,
        extractor: E,
    ) -> Self
    where
        E: FieldExtractor<T> + 'static,
    {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            extractor: Arc::new(extractor),
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Warehouse type tag, uninterpreted
    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    /// Run the extractor against a record
    pub fn extract(&self, record: &T) -> anyhow::Result<JsonValue> {
        self.extractor.extract(record)
    }
}

impl<T: ?Sized> Clone for FieldSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            column_type: self.column_type.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<T: ?Sized> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("column_type", &self.column_type)
            .finish_non_exhaustive()
    }
}
