//! In-memory Parquet part writer
//!
//! Encodes Arrow RecordBatches into a Parquet buffer that a sink uploads
//! once the part is complete.

use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

/// Compression codec names accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    /// Snappy (fast, moderate ratio)
    #[default]
    Snappy,
    /// Zstandard
    Zstd,
    /// Gzip
    Gzip,
    /// No compression
    None,
}

/// Configuration for Parquet output
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
    dictionary_enabled: bool,
    statistics_enabled: bool,
}

impl ParquetWriterConfig {
    /// Get dictionary encoding enabled
    #[must_use]
    pub fn is_dictionary_enabled(&self) -> bool {
        self.dictionary_enabled
    }

    /// Get statistics enabled
    #[must_use]
    pub fn is_statistics_enabled(&self) -> bool {
        self.statistics_enabled
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Get the compression codec
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
            dictionary_enabled: true,
            statistics_enabled: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression algorithm
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set compression from a configuration codec name
    #[must_use]
    pub fn with_codec(self, codec: CompressionCodec) -> Self {
        match codec {
            CompressionCodec::Snappy => self.with_compression(Compression::SNAPPY),
            CompressionCodec::Zstd => self.zstd(),
            CompressionCodec::Gzip => self.gzip(),
            CompressionCodec::None => self.uncompressed(),
        }
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Enable or disable statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    /// Use ZSTD compression
    #[must_use]
    pub fn zstd(mut self) -> Self {
        self.compression = Compression::ZSTD(parquet::basic::ZstdLevel::default());
        self
    }

    /// Use GZIP compression
    #[must_use]
    pub fn gzip(mut self) -> Self {
        self.compression = Compression::GZIP(parquet::basic::GzipLevel::default());
        self
    }

    /// Build writer properties
    fn build_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size);

        if !self.dictionary_enabled {
            builder = builder.set_dictionary_enabled(false);
        }

        if !self.statistics_enabled {
            builder =
                builder.set_statistics_enabled(parquet::file::properties::EnabledStatistics::None);
        }

        builder.build()
    }
}

/// Parquet part encoded into memory
pub struct PartWriter {
    /// Arrow writer over the output buffer
    writer: ArrowWriter<Vec<u8>>,
    /// Number of rows written
    rows_written: usize,
}

impl PartWriter {
    /// Create a new part writer for a schema
    pub fn new(schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        let props = config.build_properties();
        let writer = ArrowWriter::try_new(Vec::new(), schema, Some(props)).map_err(|e| {
            Error::Sink {
                message: format!("Failed to create Parquet writer: {e}"),
            }
        })?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch to the part
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch).map_err(|e| Error::Sink {
            message: format!("Failed to write batch: {e}"),
        })?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Finish the part, returning its bytes and row count
    pub fn finish(self) -> Result<(Bytes, usize)> {
        let rows = self.rows_written;
        let buf = self.writer.into_inner().map_err(|e| Error::Sink {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok((Bytes::from(buf), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_config_default() {
        let config = ParquetWriterConfig::default();
        assert_eq!(config.row_group_size(), 1024 * 1024);
        assert!(config.is_dictionary_enabled());
        assert!(config.is_statistics_enabled());
        assert_eq!(config.compression(), Compression::SNAPPY);
    }

    #[test]
    fn test_writer_config_builder() {
        let config = ParquetWriterConfig::new()
            .with_row_group_size(500)
            .with_dictionary(false)
            .with_statistics(false)
            .with_codec(CompressionCodec::None);

        assert_eq!(config.row_group_size(), 500);
        assert!(!config.is_dictionary_enabled());
        assert!(!config.is_statistics_enabled());
        assert_eq!(config.compression(), Compression::UNCOMPRESSED);
    }

    #[test]
    fn test_codec_serde() {
        let codec: CompressionCodec = serde_yaml::from_str("zstd").unwrap();
        assert_eq!(codec, CompressionCodec::Zstd);
    }
}
