//! Table definitions loaded from YAML
//!
//! A table definition declares the destination, the columns and how each
//! column is read from a JSON record, and where Parquet output goes.
//!
//! ```yaml
//! destination:
//!   project: my-project
//!   dataset: game_stats
//!   table: scores
//! columns:
//!   - name: team
//!     type: STRING
//!     path: team
//!   - name: total_score
//!     type: INTEGER
//!     path: score
//! output:
//!   url: ./warehouse
//! ```

use crate::destination::TableReference;
use crate::error::{Error, Result};
use crate::mapping::{FieldSpec, Mapping, PathExtractor};
use crate::projector::WriteToTable;
use crate::sink::{CloudDestination, CompressionCodec, ParquetSink, ParquetWriterConfig};
use crate::types::{CreateDisposition, JsonValue, WriteDisposition};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// Table Config
// ============================================================================

/// Complete table definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Destination table, as a mapping or a `project:dataset.table` string
    #[serde(deserialize_with = "deserialize_destination")]
    pub destination: TableReference,

    /// Path used to identify records in projection errors
    #[serde(default)]
    pub record_key: Option<String>,

    /// Whether the table may be created
    #[serde(default)]
    pub create_disposition: CreateDisposition,

    /// How rows are added
    #[serde(default)]
    pub write_disposition: WriteDisposition,

    /// Output columns in order
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,

    /// Parquet output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// One output column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Column name
    pub name: String,

    /// Warehouse type tag
    #[serde(rename = "type")]
    pub column_type: String,

    /// Path into the record (defaults to the column name)
    #[serde(default)]
    pub path: Option<String>,

    /// Fail the record if the path is missing instead of writing null
    #[serde(default)]
    pub required: bool,
}

impl ColumnConfig {
    /// Path into the record
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Parquet output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Local directory or `s3://`, `r2://`, `gs://`, `az://` URL
    #[serde(default)]
    pub url: Option<String>,

    /// Rows per RecordBatch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Compression codec
    #[serde(default)]
    pub compression: CompressionCodec,

    /// Maximum rows per Parquet row group
    #[serde(default)]
    pub row_group_size: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DestinationDef {
    Spec(String),
    Parts(TableReference),
}

fn deserialize_destination<'de, D>(deserializer: D) -> std::result::Result<TableReference, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match DestinationDef::deserialize(deserializer)? {
        DestinationDef::Spec(spec) => TableReference::parse(&spec).map_err(serde::de::Error::custom),
        DestinationDef::Parts(table) => Ok(table),
    }
}

fn default_batch_size() -> usize {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            url: None,
            batch_size: default_batch_size(),
            compression: CompressionCodec::default(),
            row_group_size: None,
        }
    }
}

impl TableConfig {
    /// Check the definition without touching any storage
    pub fn validate(&self) -> Result<()> {
        self.build_mapping()?;
        if let Some(key) = &self.record_key {
            PathExtractor::new(key)?;
        }
        if self.output.batch_size == 0 {
            return Err(Error::config("output.batch_size must be greater than 0"));
        }
        Ok(())
    }

    /// Build the column mapping over JSON records
    pub fn build_mapping(&self) -> Result<Mapping<JsonValue>> {
        let fields = self
            .columns
            .iter()
            .map(|column| {
                let extractor = PathExtractor::new(column.path())?.required(column.required);
                Ok(FieldSpec::with_extractor(
                    &column.name,
                    &column.column_type,
                    extractor,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Mapping::new(fields)
    }

    /// Build the configured write
    pub fn build_writer(&self) -> Result<WriteToTable<JsonValue>> {
        let mut writer = WriteToTable::new(self.destination.clone(), self.build_mapping()?)
            .with_create_disposition(self.create_disposition)
            .with_write_disposition(self.write_disposition);

        if let Some(key) = &self.record_key {
            let key = PathExtractor::new(key)?;
            writer = writer.with_record_key(move |record: &JsonValue| match key.resolve(record) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            });
        }

        Ok(writer)
    }

    /// Build the Parquet sink, optionally overriding the output URL
    pub fn build_parquet_sink(&self, url_override: Option<&str>) -> Result<ParquetSink> {
        let url = url_override
            .or(self.output.url.as_deref())
            .ok_or_else(|| Error::missing_field("output.url"))?;

        let mut writer_config = ParquetWriterConfig::new().with_codec(self.output.compression);
        if let Some(size) = self.output.row_group_size {
            writer_config = writer_config.with_row_group_size(size);
        }

        Ok(ParquetSink::new(CloudDestination::parse(url)?)
            .with_writer_config(writer_config)
            .with_batch_size(self.output.batch_size))
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load a table definition from a YAML file
pub fn load_table_config(path: impl AsRef<Path>) -> Result<TableConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read table definition '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_table_config_from_str(&content)
}

/// Parse a table definition from a YAML string
pub fn load_table_config_from_str(yaml: &str) -> Result<TableConfig> {
    let config: TableConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}
