//! Sink module
//!
//! Durable write path for projected rows.
//!
//! # Overview
//!
//! The sink module provides:
//! - `TableSink` - Trait implemented by every write backend
//! - `WriteTarget` - Destination, schema and dispositions for one write
//! - `MemorySink` - In-process tables, useful for tests and previews
//! - `ParquetSink` - Arrow/Parquet files on local disk or cloud storage

mod cloud;
mod convert;
mod memory;
mod parquet_sink;
mod writer;

pub use cloud::CloudDestination;
pub use convert::{arrow_type_for, rows_to_arrow, schema_to_arrow};
pub use memory::{MemorySink, MemoryTable};
pub use parquet_sink::{ParquetSink, SCHEMA_MARKER};
pub use writer::{CompressionCodec, ParquetWriterConfig, PartWriter};

use crate::destination::TableReference;
use crate::error::Result;
use crate::projector::{Row, SchemaDescriptor};
use crate::types::{CreateDisposition, WriteDisposition};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazily produced rows; an `Err` item aborts the write
pub type RowStream<'a> = BoxStream<'a, Result<Row>>;

/// Everything a sink needs to know about one write besides the rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    /// Table to write to
    pub destination: TableReference,
    /// Schema used to create or validate the table
    pub schema: SchemaDescriptor,
    /// Whether a missing table may be created
    pub create_disposition: CreateDisposition,
    /// How rows are added to the table
    pub write_disposition: WriteDisposition,
}

impl WriteTarget {
    /// Target with create-if-needed and append-only policies
    pub fn new(destination: TableReference, schema: SchemaDescriptor) -> Self {
        Self {
            destination,
            schema,
            create_disposition: CreateDisposition::CreateIfNeeded,
            write_disposition: WriteDisposition::WriteAppend,
        }
    }

    /// Set the create disposition
    #[must_use]
    pub fn with_create_disposition(mut self, disposition: CreateDisposition) -> Self {
        self.create_disposition = disposition;
        self
    }

    /// Set the write disposition
    #[must_use]
    pub fn with_write_disposition(mut self, disposition: WriteDisposition) -> Self {
        self.write_disposition = disposition;
        self
    }
}

/// A backend that durably writes rows into a warehouse table
///
/// Batching, retries and partial-failure handling are the sink's concern.
/// Errors from the row stream must be returned unchanged.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Consume the row stream and write it to the target table
    async fn write(&self, target: &WriteTarget, rows: RowStream<'_>) -> Result<()>;
}
