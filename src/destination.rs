//! Warehouse table addressing

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-part address of a warehouse table
///
/// Identifiers are not validated here; sinks reject the ones they cannot
/// resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableReference {
    /// Project owning the dataset
    #[serde(rename = "project")]
    pub project_id: String,
    /// Dataset holding the table
    #[serde(rename = "dataset")]
    pub dataset_id: String,
    /// Table name
    #[serde(rename = "table")]
    pub table_id: String,
}

impl TableReference {
    /// Build a reference from table, dataset and project identifiers
    pub fn new(
        table_id: impl Into<String>,
        dataset_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Parse a `project:dataset.table` or `project.dataset.table` string
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidTableReference {
            reference: spec.to_string(),
            message: message.to_string(),
        };

        // Domain-scoped projects ("example.com:proj") carry their own colon
        let (project, rest) = match spec.rsplit_once(':') {
            Some((project, rest)) => (project, rest),
            None => spec
                .split_once('.')
                .ok_or_else(|| invalid("expected project:dataset.table"))?,
        };

        let (dataset, table) = rest
            .split_once('.')
            .ok_or_else(|| invalid("expected dataset.table after project"))?;

        if table.contains('.') {
            return Err(invalid("too many components"));
        }

        Ok(Self::new(table, dataset, project))
    }

    /// Identifier that is empty, if any (named for error messages)
    pub fn first_empty_identifier(&self) -> Option<&'static str> {
        if self.project_id.is_empty() {
            Some("project")
        } else if self.dataset_id.is_empty() {
            Some("dataset")
        } else if self.table_id.is_empty() {
            Some("table")
        } else {
            None
        }
    }

    /// Identifier that cannot be used as a single path segment, if any
    ///
    /// Separators, `.`/`..` and control characters would let one table's
    /// files land inside another table's directory.
    pub fn first_path_unsafe_identifier(&self) -> Option<&'static str> {
        let unsafe_segment = |id: &str| {
            id == "."
                || id == ".."
                || id.chars().any(|c| c == '/' || c == '\\' || c.is_control())
        };
        [
            ("project", self.project_id.as_str()),
            ("dataset", self.dataset_id.as_str()),
            ("table", self.table_id.as_str()),
        ]
        .into_iter()
        .find(|(_, id)| unsafe_segment(id))
        .map(|(kind, _)| kind)
    }

    /// Object-store style prefix `project/dataset/table`
    pub fn path_prefix(&self) -> String {
        format!("{}/{}/{}", self.project_id, self.dataset_id, self.table_id)
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}
