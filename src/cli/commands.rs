//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Project JSON records into warehouse tables
#[derive(Parser, Debug)]
#[command(name = "rowsink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Table definition file (YAML)
    #[arg(short, long, global = true)]
    pub table: Option<PathBuf>,

    /// Input records (JSON Lines); reads stdin when omitted
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the table schema derived from the definition
    Schema,

    /// Project input records and print the rows
    Project {
        /// Maximum records to project
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Project input records and write them as Parquet
    Write {
        /// Output destination (local path or cloud URL)
        /// Supports: /path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate the table definition
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
