//! Common types used throughout rowsink
//!
//! This module contains shared type definitions, type aliases,
//! and the write policies handed to sinks.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type (insertion ordered)
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Create Disposition
// ============================================================================

/// Whether a sink may create the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateDisposition {
    /// Create the table from the schema if it does not exist
    #[default]
    CreateIfNeeded,
    /// Fail if the table does not exist
    CreateNever,
}

impl fmt::Display for CreateDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateIfNeeded => f.write_str("CREATE_IF_NEEDED"),
            Self::CreateNever => f.write_str("CREATE_NEVER"),
        }
    }
}

// ============================================================================
// Write Disposition
// ============================================================================

/// How rows are added to the destination table. Existing rows are never
/// overwritten or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Append rows to whatever the table already holds
    #[default]
    WriteAppend,
    /// Only write if the table holds no rows yet
    WriteEmpty,
}

impl fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteAppend => f.write_str("WRITE_APPEND"),
            Self::WriteEmpty => f.write_str("WRITE_EMPTY"),
        }
    }
}

// ============================================================================
// Completion Token
// ============================================================================

/// Completion token returned once rows have been handed to a sink.
///
/// Carries no payload; per-batch write results are not observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Done;
