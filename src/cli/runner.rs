//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_table_config, TableConfig};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use serde_json::json;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// Decode one JSON Lines line; blank lines yield `None`
fn decode_line(line: &str, line_num: usize) -> Result<Option<JsonValue>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| Error::Decode {
            line: line_num,
            message: e.to_string(),
        })
}

/// Decode JSON Lines input (one JSON value per line, blank lines skipped)
pub fn decode_jsonl(body: &str) -> Result<Vec<JsonValue>> {
    let mut records = Vec::new();

    for (line_num, line) in body.lines().enumerate() {
        if let Some(value) = decode_line(line, line_num + 1)? {
            records.push(value);
        }
    }

    Ok(records)
}

/// Stream JSON Lines records from a reader, one line at a time
///
/// A malformed line ends the stream with an [`Error::Decode`].
pub fn jsonl_stream<R>(reader: R) -> BoxStream<'static, Result<JsonValue>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    stream::try_unfold((reader.lines(), 0usize), |(mut lines, mut line_num)| async move {
        next_record(&mut lines, &mut line_num)
            .await
            .map(|record| record.map(|value| (value, (lines, line_num))))
    })
    .boxed()
}

async fn next_record<R>(lines: &mut Lines<R>, line_num: &mut usize) -> Result<Option<JsonValue>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        *line_num += 1;
        if let Some(value) = decode_line(&line, *line_num)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Schema => self.schema(),
            Commands::Project { max_records } => self.project(*max_records).await,
            Commands::Write { output } => self.write(output.as_deref()).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load table definition
    fn load_table(&self) -> Result<TableConfig> {
        let path = self
            .cli
            .table
            .as_ref()
            .ok_or_else(|| Error::config("Table definition not specified (use -t flag)"))?;
        load_table_config(path)
    }

    /// Stream input records from the input file or stdin
    async fn record_stream(&self) -> Result<BoxStream<'static, Result<JsonValue>>> {
        let reader: Box<dyn AsyncRead + Unpin + Send> = match &self.cli.input {
            Some(path) => Box::new(tokio::fs::File::open(path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::FileNotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    Error::Io(e)
                }
            })?),
            None => Box::new(tokio::io::stdin()),
        };
        Ok(jsonl_stream(BufReader::new(reader)))
    }

    /// Print the derived schema
    fn schema(&self) -> Result<()> {
        let writer = self.load_table()?.build_writer()?;
        self.output_message(&json!({
            "type": "SCHEMA",
            "table": writer.destination().to_string(),
            "schema": writer.schema(),
        }));
        Ok(())
    }

    /// Project records and print each row
    async fn project(&self, max_records: Option<usize>) -> Result<()> {
        let writer = self.load_table()?.build_writer()?;
        let records = self
            .record_stream()
            .await?
            .take(max_records.unwrap_or(usize::MAX));

        let mut rows = writer.project_stream(records).boxed();
        let mut count = 0usize;
        while let Some(row) = rows.try_next().await? {
            self.output_message(&json!({
                "type": "RECORD",
                "table": writer.destination().to_string(),
                "row": row,
            }));
            count += 1;
        }

        tracing::info!("Projected {} records for {}", count, writer.destination());
        Ok(())
    }

    /// Project records and write them to Parquet
    async fn write(&self, output: Option<&str>) -> Result<()> {
        let table = self.load_table()?;
        let writer = table.build_writer()?;
        let sink = table.build_parquet_sink(output)?;

        let mut count = 0usize;
        let records = self.record_stream().await?.inspect_ok(|_| count += 1);

        let start = Instant::now();
        writer.try_run(records, &sink).await?;
        let elapsed = start.elapsed();

        self.output_message(&json!({
            "type": "DONE",
            "table": writer.destination().to_string(),
            "records": count,
            "destination": sink.destination().scheme(),
            "duration_ms": elapsed.as_millis() as u64,
        }));
        Ok(())
    }

    /// Validate the table definition
    fn validate(&self) -> Result<()> {
        let table = self.load_table()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Table '{}' is valid with {} columns",
                    table.destination,
                    table.columns.len()
                )
            }
        }));

        Ok(())
    }

    /// Print a message in the selected format
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
