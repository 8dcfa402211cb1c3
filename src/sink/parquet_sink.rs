//! Parquet table sink
//!
//! Lays tables out as `{project}/{dataset}/{table}/` directories holding a
//! `_schema.json` marker and Hive-style partitioned part files:
//! `{project}/{dataset}/{table}/dt={YYYY-MM-DD}/part-{timestamp}-{seq}.parquet`

use super::cloud::CloudDestination;
use super::convert::{check_row_columns, rows_to_arrow, schema_to_arrow};
use super::writer::{ParquetWriterConfig, PartWriter};
use super::{RowStream, TableSink, WriteTarget};
use crate::destination::TableReference;
use crate::error::{Error, Result};
use crate::projector::{Row, SchemaDescriptor};
use crate::types::{CreateDisposition, WriteDisposition};
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::TryStreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Name of the schema marker object inside a table directory
pub const SCHEMA_MARKER: &str = "_schema.json";

/// Default number of rows per RecordBatch
const DEFAULT_BATCH_SIZE: usize = 1000;

static PART_SEQ: AtomicU64 = AtomicU64::new(0);

/// Build the object path for a new part file of a table
fn build_part_path(table: &TableReference) -> String {
    let now = Utc::now();
    let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}/dt={}/part-{}-{seq:06}.parquet",
        table.path_prefix(),
        now.format("%Y-%m-%d"),
        now.format("%Y%m%dT%H%M%S%6f"),
    )
}

/// Compare a table's stored schema against the schema of a write
fn check_table_schema(
    existing: &SchemaDescriptor,
    target: &WriteTarget,
    table_name: &str,
) -> Result<()> {
    if *existing == target.schema {
        return Ok(());
    }
    let expected: Vec<&str> = existing.names().collect();
    Err(Error::schema_mismatch(
        table_name,
        format!("table was created with columns {expected:?}"),
    ))
}

/// Sink writing Parquet part files to local disk or object storage
///
/// Rows of one write are encoded into a single part that is uploaded once the
/// row stream ends; a failed write uploads no part. Existing parts are never
/// rewritten.
///
/// With [`CreateDisposition::CreateIfNeeded`] the table's `_schema.json` marker
/// is created before the row stream is consumed, so a write that later fails
/// (for example on a projection error) still leaves a new, empty table behind.
///
/// Identifiers are used as path segments; ones containing separators, `.`/`..`
/// or control characters are rejected.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    destination: CloudDestination,
    writer_config: ParquetWriterConfig,
    batch_size: usize,
}

impl ParquetSink {
    /// Create a sink over a storage destination
    pub fn new(destination: CloudDestination) -> Self {
        Self {
            destination,
            writer_config: ParquetWriterConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set Parquet writer options
    #[must_use]
    pub fn with_writer_config(mut self, config: ParquetWriterConfig) -> Self {
        self.writer_config = config;
        self
    }

    /// Set the number of rows per RecordBatch
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Storage destination
    pub fn destination(&self) -> &CloudDestination {
        &self.destination
    }

    /// Rows per RecordBatch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Part files of a table, sorted by path
    pub async fn list_parts(&self, table: &TableReference) -> Result<Vec<String>> {
        let paths = self.destination.list(&table.path_prefix()).await?;
        Ok(paths
            .into_iter()
            .filter(|p| p.ends_with(".parquet"))
            .collect())
    }

    /// Read a part file's bytes
    pub async fn read_part(&self, path: &str) -> Result<Option<Bytes>> {
        self.destination.read(path).await
    }

    /// Stored schema of a table, if it exists
    pub async fn table_schema(&self, table: &TableReference) -> Result<Option<SchemaDescriptor>> {
        let marker = format!("{}/{SCHEMA_MARKER}", table.path_prefix());
        match self.destination.read(&marker).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Validate or create the table according to the create disposition
    async fn prepare_table(&self, target: &WriteTarget, table_name: &str) -> Result<()> {
        match self.table_schema(&target.destination).await? {
            Some(existing) => check_table_schema(&existing, target, table_name),
            None if target.create_disposition == CreateDisposition::CreateNever => {
                Err(Error::TableNotFound {
                    table: table_name.to_string(),
                })
            }
            None => self.create_table(target, table_name).await,
        }
    }

    /// Write the schema marker. Losing a creation race to another writer is
    /// fine as long as it created the table with the same schema.
    async fn create_table(&self, target: &WriteTarget, table_name: &str) -> Result<()> {
        let marker = format!("{}/{SCHEMA_MARKER}", target.destination.path_prefix());
        let body = serde_json::to_vec_pretty(&target.schema)?;

        match self.destination.create(&marker, Bytes::from(body)).await {
            Ok(path) => {
                tracing::info!("Created table {} at {}", table_name, path);
                Ok(())
            }
            Err(Error::ObjectExists { .. }) => {
                tracing::debug!("Table {} was created concurrently", table_name);
                match self.table_schema(&target.destination).await? {
                    Some(existing) => check_table_schema(&existing, target, table_name),
                    None => Err(Error::sink(format!(
                        "Schema marker for {table_name} exists but cannot be read"
                    ))),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn flush(
        &self,
        buffer: &mut Vec<Row>,
        writer: &mut PartWriter,
        target: &WriteTarget,
        arrow_schema: &SchemaRef,
    ) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let batch = rows_to_arrow(buffer, &target.schema, arrow_schema)?;
        writer.write(&batch)?;
        tracing::debug!(
            "Encoded batch of {} rows ({} total) for {}",
            batch.num_rows(),
            writer.rows_written(),
            target.destination
        );
        buffer.clear();
        Ok(())
    }
}

#[async_trait]
impl TableSink for ParquetSink {
    async fn write(&self, target: &WriteTarget, mut rows: RowStream<'_>) -> Result<()> {
        let table_name = target.destination.to_string();

        if let Some(identifier) = target.destination.first_empty_identifier() {
            return Err(Error::destination(
                table_name,
                format!("{identifier} identifier is empty"),
            ));
        }
        if let Some(identifier) = target.destination.first_path_unsafe_identifier() {
            return Err(Error::destination(
                table_name,
                format!("{identifier} identifier is not a valid path segment"),
            ));
        }

        // Unsupported column types fail before anything is written
        let arrow_schema = Arc::new(schema_to_arrow(&target.schema)?);

        self.prepare_table(target, &table_name).await?;

        if target.write_disposition == WriteDisposition::WriteEmpty
            && !self.list_parts(&target.destination).await?.is_empty()
        {
            return Err(Error::TableNotEmpty { table: table_name });
        }

        if target.schema.is_empty() {
            let mut count = 0usize;
            while let Some(row) = rows.try_next().await? {
                check_row_columns(&row, &target.schema, &table_name)?;
                count += 1;
            }
            tracing::warn!(
                "Table {} has no columns; dropped {} empty rows",
                table_name,
                count
            );
            return Ok(());
        }

        let mut writer = PartWriter::new(Arc::clone(&arrow_schema), &self.writer_config)?;
        let mut buffer: Vec<Row> = Vec::with_capacity(self.batch_size);

        while let Some(row) = rows.try_next().await? {
            check_row_columns(&row, &target.schema, &table_name)?;
            buffer.push(row);
            if buffer.len() >= self.batch_size {
                self.flush(&mut buffer, &mut writer, target, &arrow_schema)?;
            }
        }
        self.flush(&mut buffer, &mut writer, target, &arrow_schema)?;

        if writer.rows_written() == 0 {
            tracing::info!("No rows to write to {}", table_name);
            return Ok(());
        }

        let (bytes, count) = writer.finish()?;
        let path = self
            .destination
            .create(&build_part_path(&target.destination), bytes)
            .await?;
        tracing::info!("Wrote {} rows to {}", count, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_part_path_layout() {
        let table = TableReference::new("scores", "game_stats", "my-project");
        let path = build_part_path(&table);
        assert!(path.starts_with("my-project/game_stats/scores/dt="));
        assert!(path.ends_with(".parquet"));
        assert_ne!(path, build_part_path(&table));
    }

    #[test]
    fn test_batch_size_minimum() {
        let sink = ParquetSink::new(CloudDestination::in_memory()).with_batch_size(0);
        assert_eq!(sink.batch_size(), 1);
    }

    fn scores_target(columns: &[(&str, &str)]) -> WriteTarget {
        let schema = SchemaDescriptor::new(
            columns
                .iter()
                .map(|(name, ty)| crate::projector::ColumnSchema::new(*name, *ty))
                .collect(),
        );
        WriteTarget::new(TableReference::new("scores", "game_stats", "my-project"), schema)
    }

    #[tokio::test]
    async fn test_create_table_after_losing_race_with_same_schema() {
        let sink = ParquetSink::new(CloudDestination::in_memory());
        let target = scores_target(&[("team", "STRING")]);

        // Another writer created the marker between our read and our create
        sink.create_table(&target, "my-project:game_stats.scores")
            .await
            .unwrap();
        sink.create_table(&target, "my-project:game_stats.scores")
            .await
            .unwrap();

        assert_eq!(
            sink.table_schema(&target.destination).await.unwrap(),
            Some(target.schema.clone())
        );
    }

    #[tokio::test]
    async fn test_create_table_after_losing_race_with_other_schema() {
        let sink = ParquetSink::new(CloudDestination::in_memory());
        sink.create_table(&scores_target(&[("team", "STRING")]), "t")
            .await
            .unwrap();

        let err = sink
            .create_table(&scores_target(&[("team", "INTEGER")]), "t")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }
}
