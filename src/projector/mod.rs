//! Projector module
//!
//! Turns typed records into table rows and hands them to a sink.
//!
//! # Overview
//!
//! The projector module provides:
//! - `derive_schema` - Table schema from a mapping
//! - `project_record` - One record to one row
//! - `WriteToTable` - Destination plus mapping, wired to a `TableSink`
//!
//! ```rust,ignore
//! let mapping = Mapping::builder()
//!     .infallible("team", "STRING", |r: &Score| json!(r.team))
//!     .infallible("total_score", "INTEGER", |r: &Score| json!(r.score))
//!     .build()?;
//! let write = WriteToTable::new(TableReference::new("scores", "game_stats", "my-project"), mapping);
//! write.run(stream::iter(scores), &sink).await?;
//! ```

mod row;
mod schema;

pub use row::Row;
pub use schema::{derive_schema, ColumnSchema, SchemaDescriptor};

use crate::destination::TableReference;
use crate::error::{Error, Result};
use crate::mapping::Mapping;
use crate::sink::{TableSink, WriteTarget};
use crate::types::{CreateDisposition, Done, WriteDisposition};
use futures::{Stream, StreamExt};
use std::fmt;
use std::sync::Arc;

type RecordKeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Project one record into a row, invoking extractors in mapping order
///
/// The first failing extractor aborts the projection; no partial row is
/// returned.
pub fn project_record<T: ?Sized>(record: &T, mapping: &Mapping<T>) -> Result<Row> {
    project_tagged(record, mapping, || None)
}

fn project_tagged<T: ?Sized>(
    record: &T,
    mapping: &Mapping<T>,
    identity: impl Fn() -> Option<String>,
) -> Result<Row> {
    let mut row = Row::with_capacity(mapping.len());
    for field in mapping.fields() {
        let value = field
            .extract(record)
            .map_err(|e| Error::projection(field.name(), identity(), e))?;
        row.set(field.name(), value);
    }
    Ok(row)
}

/// Writes a stream of records into one warehouse table
///
/// Holds the destination and mapping for its whole lifetime; the schema is
/// derived once at construction. Shareable across threads when the
/// extractors are.
pub struct WriteToTable<T: ?Sized> {
    destination: TableReference,
    mapping: Mapping<T>,
    schema: SchemaDescriptor,
    create_disposition: CreateDisposition,
    write_disposition: WriteDisposition,
    record_key: Option<RecordKeyFn<T>>,
}

impl<T: ?Sized> WriteToTable<T> {
    /// Configure a write of `mapping`-shaped rows into `destination`
    pub fn new(destination: TableReference, mapping: Mapping<T>) -> Self {
        let schema = derive_schema(&mapping);
        Self {
            destination,
            mapping,
            schema,
            create_disposition: CreateDisposition::CreateIfNeeded,
            write_disposition: WriteDisposition::WriteAppend,
            record_key: None,
        }
    }

    /// Identify records in projection errors by a key
    #[must_use]
    pub fn with_record_key<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.record_key = Some(Arc::new(key));
        self
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

    /// Destination table
    pub fn destination(&self) -> &TableReference {
        &self.destination
    }

    /// Field mapping
    pub fn mapping(&self) -> &Mapping<T> {
        &self.mapping
    }

    /// Schema derived from the mapping
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Destination, schema and dispositions handed to the sink
    pub fn write_target(&self) -> WriteTarget {
        WriteTarget::new(self.destination.clone(), self.schema.clone())
            .with_create_disposition(self.create_disposition)
            .with_write_disposition(self.write_disposition)
    }

    /// Project one record, tagging failures with the record key if set
    pub fn project(&self, record: &T) -> Result<Row> {
        project_tagged(record, &self.mapping, || self.key_of(record))
    }

    fn project_at(&self, record: &T, position: usize) -> Result<Row> {
        project_tagged(record, &self.mapping, || {
            Some(self.key_of(record).unwrap_or_else(|| format!("#{position}")))
        })
    }

    fn key_of(&self, record: &T) -> Option<String> {
        self.record_key.as_ref().map(|key| key(record))
    }
}

impl<T: Send> WriteToTable<T> {
    /// Project every record of a stream and hand the rows to `sink`
    ///
    /// Rows are produced lazily, in input order. Projection and sink errors
    /// are returned unchanged; nothing is retried.
    pub async fn run<S>(&self, records: S, sink: &dyn TableSink) -> Result<Done>
    where
        S: Stream<Item = T> + Send,
    {
        self.try_run(records.map(Ok), sink).await
    }

    /// Like [`run`](Self::run) for a fallible record source
    ///
    /// An `Err` from the source aborts the write and is returned unchanged.
    pub async fn try_run<S>(&self, records: S, sink: &dyn TableSink) -> Result<Done>
    where
        S: Stream<Item = Result<T>> + Send,
    {
        let target = self.write_target();
        tracing::info!(
            "Writing to {} ({} columns, {}, {})",
            target.destination,
            target.schema.len(),
            target.create_disposition,
            target.write_disposition
        );

        let rows = self.project_stream(records).boxed();
        sink.write(&target, rows).await?;
        Ok(Done)
    }

    /// Project a fallible record stream lazily without writing it
    pub fn project_stream<'a, S>(&'a self, records: S) -> impl Stream<Item = Result<Row>> + Send + 'a
    where
        S: Stream<Item = Result<T>> + Send + 'a,
        T: 'a,
    {
        records.enumerate().map(move |(position, record)| {
            record.and_then(|record| self.project_at(&record, position))
        })
    }

    /// Like [`run`](Self::run) for an in-memory collection of records
    pub async fn run_iter<I>(&self, records: I, sink: &dyn TableSink) -> Result<Done>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send,
    {
        self.run(futures::stream::iter(records), sink).await
    }

    /// Project records lazily without writing them
    pub fn project_all<'a, I>(&'a self, records: I) -> impl Iterator<Item = Result<Row>> + 'a
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        records
            .into_iter()
            .enumerate()
            .map(move |(position, record)| self.project_at(&record, position))
    }
}

impl<T: ?Sized> fmt::Debug for WriteToTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteToTable")
            .field("destination", &self.destination)
            .field("schema", &self.schema)
            .field("create_disposition", &self.create_disposition)
            .field("write_disposition", &self.write_disposition)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
