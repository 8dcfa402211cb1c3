//! Declarative path extractor for JSON records
//!
//! Supports simple paths like `"$.user.name"`, `"user.name"`,
//! `"items[0].id"` and `"items[-1]"`.

use super::field::FieldExtractor;
use crate::error::{Error, Result};
use crate::types::JsonValue;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(i64),
}

/// Extracts a value from a JSON record by following a path
#[derive(Debug, Clone)]
pub struct PathExtractor {
    path: String,
    segments: Vec<Segment>,
    required: bool,
}

impl PathExtractor {
    /// Parse a path. Missing values extract as `null`.
    pub fn new(path: &str) -> Result<Self> {
        let segments = parse_path(path)?;
        Ok(Self {
            path: path.to_string(),
            segments,
            required: false,
        })
    }

    /// Fail extraction instead of yielding `null` when the path is missing
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// The path as written
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Follow the path, returning `None` if any segment is missing
    pub fn resolve<'a>(&self, value: &'a JsonValue) -> Option<&'a JsonValue> {
        let mut current = value;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.get(key.as_str())?,
                Segment::Index(index) => {
                    let arr = current.as_array()?;
                    #[allow(clippy::cast_possible_wrap)]
                    let idx = if *index < 0 {
                        arr.len() as i64 + index
                    } else {
                        *index
                    };
                    arr.get(usize::try_from(idx).ok()?)?
                }
            };
        }
        Some(current)
    }
}

impl FieldExtractor<JsonValue> for PathExtractor {
    fn extract(&self, record: &JsonValue) -> anyhow::Result<JsonValue> {
        match self.resolve(record) {
            Some(value) => Ok(value.clone()),
            None if self.required => anyhow::bail!("path '{}' not found in record", self.path),
            None => Ok(JsonValue::Null),
        }
    }
}

fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let invalid = |message: &str| Error::config(format!("Invalid path '{path}': {message}"));

    let trimmed = path.strip_prefix("$.").unwrap_or(path);
    let trimmed = if trimmed == "$" { "" } else { trimmed };
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for part in trimmed.split('.') {
        if part.is_empty() {
            return Err(invalid("empty segment"));
        }

        // Handle array indexing like "data[0]" or "items[-1]"
        let (name, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };

        if !name.is_empty() {
            segments.push(Segment::Key(name.to_string()));
        }

        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            let index = rest[1..close]
                .parse::<i64>()
                .map_err(|_| invalid("array index must be an integer"))?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("unexpected characters after ']'"));
            }
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn record() -> JsonValue {
        json!({
            "user": {"name": "alice", "team": "red"},
            "scores": [10, 20, 30],
            "matrix": [[1, 2], [3, 4]],
            "score": 42
        })
    }

    #[test_case("score", json!(42) ; "top level")]
    #[test_case("$.user.name", json!("alice") ; "dollar prefix")]
    #[test_case("user.team", json!("red") ; "nested")]
    #[test_case("scores[0]", json!(10) ; "first index")]
    #[test_case("scores[-1]", json!(30) ; "negative index")]
    #[test_case("matrix[1][0]", json!(3) ; "chained index")]
    #[test_case("$", record() ; "whole record")]
    fn test_resolve(path: &str, expected: JsonValue) {
        let extractor = PathExtractor::new(path).unwrap();
        assert_eq!(extractor.extract(&record()).unwrap(), expected);
    }

    #[test]
    fn test_missing_is_null() {
        let extractor = PathExtractor::new("user.email").unwrap();
        assert_eq!(extractor.extract(&record()).unwrap(), JsonValue::Null);

        let extractor = PathExtractor::new("scores[7]").unwrap();
        assert_eq!(extractor.extract(&record()).unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_missing_required_fails() {
        let extractor = PathExtractor::new("user.email").unwrap().required(true);
        let err = extractor.extract(&record()).unwrap_err();
        assert!(err.to_string().contains("user.email"));
    }

    #[test_case("user..name")]
    #[test_case("scores[x]")]
    #[test_case("scores[0")]
    #[test_case("scores[0]x")]
    fn test_invalid_paths(path: &str) {
        assert!(PathExtractor::new(path).is_err());
    }
}
