//! Tests for mapping module

use super::*;
use serde_json::json;

struct Score {
    team: String,
    score: i64,
}

fn score_mapping() -> Mapping<Score> {
    Mapping::builder()
        .infallible("team", "STRING", |r: &Score| json!(r.team))
        .infallible("total_score", "INTEGER", |r: &Score| json!(r.score))
        .build()
        .unwrap()
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_mapping_preserves_insertion_order() {
    let mapping = score_mapping();
    let names: Vec<&str> = mapping.names().collect();
    assert_eq!(names, vec!["team", "total_score"]);
    assert_eq!(mapping.len(), 2);
    assert!(!mapping.is_empty());
}

#[test]
fn test_mapping_rejects_duplicate_names() {
    let result = Mapping::<Score>::builder()
        .infallible("team", "STRING", |r: &Score| json!(r.team))
        .infallible("team", "STRING", |r: &Score| json!(r.team))
        .build();

    match result {
        Err(Error::DuplicateField { name }) => assert_eq!(name, "team"),
        other => panic!("Expected DuplicateField, got {other:?}"),
    }
}

#[test]
fn test_mapping_empty() {
    let mapping = Mapping::<Score>::empty();
    assert!(mapping.is_empty());
    assert_eq!(mapping.names().count(), 0);
}

#[test]
fn test_mapping_get() {
    let mapping = score_mapping();
    let field = mapping.get("total_score").unwrap();
    assert_eq!(field.column_type(), "INTEGER");
    assert!(mapping.get("missing").is_none());
}

#[test]
fn test_mapping_clone_shares_extractors() {
    let mapping = score_mapping();
    let cloned = mapping.clone();
    let record = Score {
        team: "blue".to_string(),
        score: 7,
    };
    assert_eq!(
        cloned.fields()[1].extract(&record).unwrap(),
        mapping.fields()[1].extract(&record).unwrap()
    );
}

// ============================================================================
// FieldSpec Tests
// ============================================================================

#[test]
fn test_field_type_passed_through() {
    let field = FieldSpec::<Score>::infallible("x", "GEOGRAPHY", |_| json!(null));
    assert_eq!(field.column_type(), "GEOGRAPHY");
}

#[test]
fn test_fallible_field_error() {
    let field = FieldSpec::<Score>::new("ratio", "FLOAT", |r: &Score| {
        if r.score == 0 {
            anyhow::bail!("division by zero");
        }
        Ok(json!(100.0 / r.score as f64))
    });

    let record = Score {
        team: "red".to_string(),
        score: 0,
    };
    assert_eq!(field.extract(&record).unwrap_err().to_string(), "division by zero");
}

#[test]
fn test_field_debug_omits_extractor() {
    let field = FieldSpec::<Score>::infallible("team", "STRING", |r: &Score| json!(r.team));
    let debug = format!("{field:?}");
    assert!(debug.contains("team"));
    assert!(debug.contains("STRING"));
}

#[test]
fn test_path_extractor_as_field() {
    let field = FieldSpec::with_extractor("team", "STRING", PathExtractor::new("team").unwrap());
    assert_eq!(
        field.extract(&json!({"team": "green"})).unwrap(),
        json!("green")
    );
}
