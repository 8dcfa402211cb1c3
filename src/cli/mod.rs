//! CLI module
//!
//! Command-line interface for projecting JSON records into tables.
//!
//! # Commands
//!
//! - `schema` - Print the derived table schema
//! - `project` - Print projected rows without writing
//! - `write` - Write projected rows as Parquet
//! - `validate` - Check a table definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{decode_jsonl, jsonl_stream, Runner};
