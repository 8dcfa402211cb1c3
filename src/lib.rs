//! # rowsink
//!
//! Project typed records into warehouse table rows and write them through
//! pluggable table sinks.
//!
//! ## Features
//!
//! - **Field Mappings**: Ordered column name, type and extractor triples
//! - **Schema Derivation**: Table schema computed from the mapping alone
//! - **Streaming Writes**: Records projected lazily and handed to a sink in order
//! - **Parquet Output**: Part files on local disk, S3, R2, GCS or Azure
//! - **YAML Tables**: Declarative table definitions over JSON records
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowsink::{Mapping, MemorySink, TableReference, WriteToTable};
//! use serde_json::json;
//!
//! let mapping = Mapping::builder()
//!     .infallible("team", "STRING", |r: &Score| json!(r.team))
//!     .infallible("total_score", "INTEGER", |r: &Score| json!(r.score))
//!     .build()?;
//!
//! let write = WriteToTable::new(
//!     TableReference::new("scores", "game_stats", "my-project"),
//!     mapping,
//! );
//! write.run_iter(scores, &MemorySink::new()).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────────────┐
//! │   Mapping    │───▶│  Projector   │───▶│        TableSink        │
//! │ name, type,  │    │ derive_schema│    ├────────────┬────────────┤
//! │ extractor    │    │ project      │    │ MemorySink │ ParquetSink│
//! └──────────────┘    │ WriteToTable │    └────────────┴────────────┘
//!                     └──────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod mapping;
pub mod projector;
pub mod sink;
pub mod types;

// Re-exports for convenience
pub use config::{load_table_config, load_table_config_from_str, TableConfig};
pub use destination::TableReference;
pub use error::{Error, Result};
pub use mapping::{FieldExtractor, FieldSpec, Mapping, MappingBuilder, PathExtractor};
pub use projector::{derive_schema, project_record, ColumnSchema, Row, SchemaDescriptor, WriteToTable};
pub use sink::{CloudDestination, MemorySink, ParquetSink, TableSink, WriteTarget};
pub use types::{CreateDisposition, Done, JsonValue, WriteDisposition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
