//! Error types for rowsink
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// Boxed error produced by a caller-supplied field extractor
pub type ExtractError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for rowsink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Mapping / Projection Errors
    // ============================================================================
    #[error("Duplicate field '{name}' in mapping")]
    DuplicateField { name: String },

    #[error(
        "Failed to project field '{field}' (record: {}): {source}",
        .record.as_deref().unwrap_or("unknown")
    )]
    Projection {
        field: String,
        record: Option<String>,
        #[source]
        source: ExtractError,
    },

    // ============================================================================
    // Destination Errors
    // ============================================================================
    #[error("Invalid table reference '{reference}': {message}")]
    InvalidTableReference { reference: String, message: String },

    #[error("Cannot resolve destination '{table}': {message}")]
    DestinationResolution { table: String, message: String },

    #[error("Table '{table}' does not exist and create disposition is CREATE_NEVER")]
    TableNotFound { table: String },

    #[error("Table '{table}' is not empty and write disposition is WRITE_EMPTY")]
    TableNotEmpty { table: String },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Schema mismatch for table '{table}': {message}")]
    SchemaMismatch { table: String, message: String },

    #[error("Unsupported column type '{column_type}' for column '{column}'")]
    UnsupportedColumnType { column: String, column_type: String },

    #[error("Invalid value for column '{column}' ({column_type}): {value}")]
    InvalidValue {
        column: String,
        column_type: String,
        value: String,
    },

    #[error("Sink error: {message}")]
    Sink { message: String },

    #[error("Object already exists: {path}")]
    ObjectExists { path: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to decode input at line {line}: {message}")]
    Decode { line: usize, message: String },
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a projection error for a failing extractor
    pub fn projection(
        field: impl Into<String>,
        record: Option<String>,
        source: impl Into<ExtractError>,
    ) -> Self {
        Self::Projection {
            field: field.into(),
            record,
            source: source.into(),
        }
    }

    /// Create a destination resolution error
    pub fn destination(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestinationResolution {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        column: impl Into<String>,
        column_type: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            column: column.into(),
            column_type: column_type.into(),
            value: value.to_string(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Name of the field whose extractor failed, if this is a projection error
    pub fn failed_field(&self) -> Option<&str> {
        match self {
            Error::Projection { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Check if this error originated in a sink rather than in projection
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Error::DestinationResolution { .. }
                | Error::TableNotFound { .. }
                | Error::TableNotEmpty { .. }
                | Error::SchemaMismatch { .. }
                | Error::UnsupportedColumnType { .. }
                | Error::InvalidValue { .. }
                | Error::Sink { .. }
                | Error::ObjectExists { .. }
                | Error::Arrow(_)
                | Error::Parquet(_)
                | Error::ObjectStore(_)
        )
    }
}

/// Result type alias for rowsink
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("destination");
        assert_eq!(err.to_string(), "Missing required config field: destination");

        let err = Error::DuplicateField {
            name: "team".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate field 'team' in mapping");
    }

    #[test]
    fn test_projection_error_display() {
        let err = Error::projection("score", Some("user-7".to_string()), "not a number");
        assert_eq!(
            err.to_string(),
            "Failed to project field 'score' (record: user-7): not a number"
        );

        let err = Error::projection("score", None, "boom");
        assert_eq!(
            err.to_string(),
            "Failed to project field 'score' (record: unknown): boom"
        );
    }

    #[test]
    fn test_projection_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::projection("score", None, anyhow::anyhow!("bad input"));
        assert_eq!(err.failed_field(), Some("score"));
        assert_eq!(err.source().unwrap().to_string(), "bad input");
    }

    #[test]
    fn test_is_sink_error() {
        assert!(Error::sink("quota").is_sink_error());
        assert!(Error::ObjectExists {
            path: "p/d/t/_schema.json".to_string()
        }
        .is_sink_error());
        assert!(Error::schema_mismatch("p:d.t", "columns differ").is_sink_error());
        assert!(Error::destination("p:d.t", "empty dataset").is_sink_error());
        assert!(!Error::projection("f", None, "x").is_sink_error());
        assert!(!Error::config("x").is_sink_error());
    }
}
