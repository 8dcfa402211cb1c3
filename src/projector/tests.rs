//! Tests for projector module

use super::*;
use crate::mapping::FieldSpec;
use crate::sink::MemorySink;
use futures::stream;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct Score {
    user: String,
    team: String,
    score: i64,
}

fn score(user: &str, team: &str, score: i64) -> Score {
    Score {
        user: user.to_string(),
        team: team.to_string(),
        score,
    }
}

fn score_mapping() -> Mapping<Score> {
    Mapping::builder()
        .infallible("team", "STRING", |r: &Score| json!(r.team))
        .infallible("total_score", "INTEGER", |r: &Score| json!(r.score))
        .build()
        .unwrap()
}

fn scores_table() -> TableReference {
    TableReference::new("scores", "game_stats", "my-project")
}

// ============================================================================
// Schema Derivation Tests
// ============================================================================

#[test]
fn test_derive_schema_follows_mapping() {
    let schema = derive_schema(&score_mapping());
    assert_eq!(
        schema.columns(),
        &[
            ColumnSchema::new("team", "STRING"),
            ColumnSchema::new("total_score", "INTEGER"),
        ]
    );
}

#[test]
fn test_derive_schema_is_idempotent() {
    let mapping = score_mapping();
    assert_eq!(derive_schema(&mapping), derive_schema(&mapping));
}

#[test]
fn test_derive_schema_passes_types_verbatim() {
    let mapping = Mapping::<Score>::builder()
        .infallible("where", "geography", |_| json!(null))
        .build()
        .unwrap();
    assert_eq!(derive_schema(&mapping).columns()[0].column_type, "geography");
}

#[test]
fn test_derive_schema_empty_mapping() {
    let schema = derive_schema(&Mapping::<Score>::empty());
    assert!(schema.is_empty());
}

#[test]
fn test_schema_serializes_with_type_key() {
    let schema = derive_schema(&score_mapping());
    assert_eq!(
        serde_json::to_value(&schema).unwrap(),
        json!({"fields": [
            {"name": "team", "type": "STRING"},
            {"name": "total_score", "type": "INTEGER"}
        ]})
    );
}

// ============================================================================
// Projection Tests
// ============================================================================

#[test]
fn test_project_record_scenario() {
    let row = project_record(&score("u1", "red", 42), &score_mapping()).unwrap();
    assert_eq!(row.into_json(), json!({"team": "red", "total_score": 42}));
}

#[test]
fn test_project_record_key_order_matches_mapping() {
    let mapping = Mapping::<Score>::builder()
        .infallible("z_last_alphabetically", "STRING", |r: &Score| json!(r.user))
        .infallible("a_first_alphabetically", "INTEGER", |r: &Score| json!(r.score))
        .build()
        .unwrap();

    let row = project_record(&score("u1", "red", 1), &mapping).unwrap();
    let columns: Vec<&str> = row.columns().collect();
    assert_eq!(columns, vec!["z_last_alphabetically", "a_first_alphabetically"]);
}

#[test]
fn test_project_record_empty_mapping() {
    let row = project_record(&score("u1", "red", 1), &Mapping::empty()).unwrap();
    assert!(row.is_empty());
}

#[test]
fn test_project_record_identifies_failing_field() {
    let mapping = Mapping::<Score>::builder()
        .infallible("team", "STRING", |r: &Score| json!(r.team))
        .field("ratio", "FLOAT", |r: &Score| {
            if r.score == 0 {
                anyhow::bail!("score is zero");
            }
            Ok(json!(1.0 / r.score as f64))
        })
        .build()
        .unwrap();

    let err = project_record(&score("u1", "red", 0), &mapping).unwrap_err();
    assert_eq!(err.failed_field(), Some("ratio"));
    assert!(err.to_string().contains("score is zero"));
}

#[test]
fn test_project_record_stops_at_first_failure() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let mapping = Mapping::<Score>::builder()
        .field("broken", "STRING", |_: &Score| anyhow::bail!("nope"))
        .infallible("counted", "INTEGER", |_: &Score| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            json!(1)
        })
        .build()
        .unwrap();

    assert!(project_record(&score("u1", "red", 1), &mapping).is_err());
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn test_project_uses_record_key() {
    let mapping = Mapping::<Score>::builder()
        .field("broken", "STRING", |_: &Score| anyhow::bail!("nope"))
        .build()
        .unwrap();
    let write = WriteToTable::new(scores_table(), mapping).with_record_key(|r: &Score| r.user.clone());

    match write.project(&score("user-9", "red", 1)) {
        Err(Error::Projection { field, record, .. }) => {
            assert_eq!(field, "broken");
            assert_eq!(record.as_deref(), Some("user-9"));
        }
        other => panic!("Expected Projection error, got {other:?}"),
    }
}

#[test]
fn test_project_all_tags_position_without_key() {
    let mapping = Mapping::<Score>::builder()
        .field("checked", "INTEGER", |r: &Score| {
            anyhow::ensure!(r.score >= 0, "negative score");
            Ok(json!(r.score))
        })
        .build()
        .unwrap();
    let write = WriteToTable::new(scores_table(), mapping);

    let results: Vec<_> = write
        .project_all(vec![score("a", "red", 1), score("b", "red", -1)])
        .collect();
    assert!(results[0].is_ok());
    match &results[1] {
        Err(Error::Projection { record, .. }) => assert_eq!(record.as_deref(), Some("#1")),
        other => panic!("Expected Projection error, got {other:?}"),
    }
}

#[test]
fn test_projection_is_shareable_across_threads() {
    let write = WriteToTable::new(scores_table(), score_mapping());
    let records: Vec<Score> = (0..64).map(|i| score("u", "blue", i)).collect();

    std::thread::scope(|scope| {
        for chunk in records.chunks(16) {
            let write = &write;
            scope.spawn(move || {
                for record in chunk {
                    let row = write.project(record).unwrap();
                    assert_eq!(row.get("total_score"), Some(&json!(record.score)));
                }
            });
        }
    });
}

// ============================================================================
// WriteToTable Tests
// ============================================================================

#[test]
fn test_write_target_defaults() {
    let write = WriteToTable::new(scores_table(), score_mapping());
    let target = write.write_target();
    assert_eq!(target.destination, scores_table());
    assert_eq!(target.schema, *write.schema());
    assert_eq!(target.create_disposition, CreateDisposition::CreateIfNeeded);
    assert_eq!(target.write_disposition, WriteDisposition::WriteAppend);
}

#[test]
fn test_schema_derived_at_construction() {
    let write = WriteToTable::new(scores_table(), score_mapping());
    assert_eq!(*write.schema(), derive_schema(write.mapping()));
}

#[tokio::test]
async fn test_run_writes_rows_in_order() {
    let sink = MemorySink::new();
    let mapping = Mapping::<Score>::builder()
        .infallible("seq", "INTEGER", |r: &Score| json!(r.score))
        .build()
        .unwrap();
    let write = WriteToTable::new(scores_table(), mapping);

    let records: Vec<Score> = (0..100).map(|i| score("u", "red", i)).collect();
    let done = write.run(stream::iter(records), &sink).await.unwrap();
    assert_eq!(done, Done);

    let seqs: Vec<i64> = sink
        .rows(&scores_table())
        .await
        .iter()
        .map(|row| row.get("seq").and_then(serde_json::Value::as_i64).unwrap())
        .collect();
    assert_eq!(seqs, (0..100).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_run_propagates_projection_failure() {
    let sink = MemorySink::new();
    let mapping = Mapping::<Score>::builder()
        .infallible("team", "STRING", |r: &Score| json!(r.team))
        .spec(FieldSpec::new("score", "INTEGER", |r: &Score| {
            anyhow::ensure!(r.score < 3, "score too high");
            Ok(json!(r.score))
        }))
        .build()
        .unwrap();
    let write = WriteToTable::new(scores_table(), mapping);

    let records = vec![score("a", "red", 1), score("b", "red", 5)];
    let err = write.run_iter(records, &sink).await.unwrap_err();

    assert_eq!(err.failed_field(), Some("score"));
    // Memory sink stages the whole write, so nothing lands
    assert!(sink.table(&scores_table()).await.is_none());
}

#[tokio::test]
async fn test_run_propagates_sink_failure_unchanged() {
    let sink = MemorySink::new();
    let write = WriteToTable::new(scores_table(), score_mapping())
        .with_create_disposition(CreateDisposition::CreateNever);

    let err = write
        .run_iter(vec![score("a", "red", 1)], &sink)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TableNotFound { .. }));
}

#[tokio::test]
async fn test_try_run_returns_source_error_unchanged() {
    let sink = MemorySink::new();
    let write = WriteToTable::new(scores_table(), score_mapping());

    let records = stream::iter(vec![
        Ok(score("a", "red", 1)),
        Err(Error::Decode {
            line: 2,
            message: "expected value".to_string(),
        }),
        Ok(score("c", "red", 3)),
    ]);
    match write.try_run(records, &sink).await {
        Err(Error::Decode { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected Decode error, got {other:?}"),
    }
    assert!(sink.table(&scores_table()).await.is_none());
}

#[tokio::test]
async fn test_project_stream_tags_position() {
    use futures::TryStreamExt;

    let mapping = Mapping::<Score>::builder()
        .field("checked", "INTEGER", |r: &Score| {
            anyhow::ensure!(r.score >= 0, "negative score");
            Ok(json!(r.score))
        })
        .build()
        .unwrap();
    let write = WriteToTable::new(scores_table(), mapping);

    let records = stream::iter(vec![Ok(score("a", "red", 1)), Ok(score("b", "red", -1))]);
    let mut rows = write.project_stream(records).boxed();
    assert!(rows.try_next().await.unwrap().is_some());
    match rows.try_next().await {
        Err(Error::Projection { record, .. }) => assert_eq!(record.as_deref(), Some("#1")),
        other => panic!("Expected Projection error, got {other:?}"),
    }
}
