//! In-process table sink

use super::convert::check_row_columns;
use super::{RowStream, TableSink, WriteTarget};
use crate::destination::TableReference;
use crate::error::{Error, Result};
use crate::projector::{Row, SchemaDescriptor};
use crate::types::{CreateDisposition, WriteDisposition};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Contents of one in-memory table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTable {
    /// Schema the table was created with
    pub schema: SchemaDescriptor,
    /// Rows in write order
    pub rows: Vec<Row>,
}

/// Sink that keeps tables in memory
///
/// A write is staged until the row stream ends and then appended in one step,
/// so a failed write leaves the table untouched.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Arc<RwLock<HashMap<TableReference, MemoryTable>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a table, as if it already existed in the warehouse
    pub async fn create_table(&self, table: TableReference, schema: SchemaDescriptor) {
        self.tables.write().await.insert(
            table,
            MemoryTable {
                schema,
                rows: Vec::new(),
            },
        );
    }

    /// Snapshot of a table
    pub async fn table(&self, table: &TableReference) -> Option<MemoryTable> {
        self.tables.read().await.get(table).cloned()
    }

    /// Rows of a table, empty if it does not exist
    pub async fn rows(&self, table: &TableReference) -> Vec<Row> {
        self.table(table).await.map(|t| t.rows).unwrap_or_default()
    }

    /// Number of tables
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }
}

#[async_trait]
impl TableSink for MemorySink {
    async fn write(&self, target: &WriteTarget, rows: RowStream<'_>) -> Result<()> {
        let table_name = target.destination.to_string();

        if let Some(identifier) = target.destination.first_empty_identifier() {
            return Err(Error::destination(
                table_name,
                format!("{identifier} identifier is empty"),
            ));
        }

        let staged: Vec<Row> = rows.try_collect().await?;
        for row in &staged {
            check_row_columns(row, &target.schema, &table_name)?;
        }

        let mut tables = self.tables.write().await;
        let table = match tables.entry(target.destination.clone()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                if existing.schema != target.schema {
                    return Err(Error::schema_mismatch(
                        table_name,
                        "existing table has a different schema",
                    ));
                }
                if target.write_disposition == WriteDisposition::WriteEmpty
                    && !existing.rows.is_empty()
                {
                    return Err(Error::TableNotEmpty { table: table_name });
                }
                existing
            }
            Entry::Vacant(entry) => {
                if target.create_disposition == CreateDisposition::CreateNever {
                    return Err(Error::TableNotFound { table: table_name });
                }
                tracing::debug!("Creating table {}", table_name);
                entry.insert(MemoryTable {
                    schema: target.schema.clone(),
                    rows: Vec::new(),
                })
            }
        };

        let count = staged.len();
        table.rows.extend(staged);
        tracing::debug!("Appended {} rows to {}", count, table_name);
        Ok(())
    }
}
