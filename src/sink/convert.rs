//! Row to Arrow conversion
//!
//! Maps warehouse column types onto Arrow types and builds typed
//! RecordBatches from projected rows.

use crate::error::{Error, Result};
use crate::projector::{ColumnSchema, Row, SchemaDescriptor};
use crate::types::JsonValue;
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;

/// Arrow type used to store a warehouse column type
pub fn arrow_type_for(column: &ColumnSchema) -> Result<DataType> {
    match column.column_type.to_ascii_uppercase().as_str() {
        "STRING" => Ok(DataType::Utf8),
        "INTEGER" | "INT64" => Ok(DataType::Int64),
        "FLOAT" | "FLOAT64" => Ok(DataType::Float64),
        // Decimal text keeps full precision
        "NUMERIC" | "BIGNUMERIC" => Ok(DataType::Utf8),
        "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
        "TIMESTAMP" => Ok(DataType::Timestamp(
            TimeUnit::Microsecond,
            Some("UTC".into()),
        )),
        "DATE" => Ok(DataType::Date32),
        _ => Err(Error::UnsupportedColumnType {
            column: column.name.clone(),
            column_type: column.column_type.clone(),
        }),
    }
}

/// Convert a table schema to an Arrow schema. All columns are nullable.
pub fn schema_to_arrow(schema: &SchemaDescriptor) -> Result<Schema> {
    let fields = schema
        .columns()
        .iter()
        .map(|column| Ok(Field::new(&column.name, arrow_type_for(column)?, true)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields))
}

/// Check that a row carries exactly the schema's columns
pub fn check_row_columns(row: &Row, schema: &SchemaDescriptor, table: &str) -> Result<()> {
    if row.len() != schema.len() || !schema.names().all(|name| row.get(name).is_some()) {
        let expected: Vec<&str> = schema.names().collect();
        let actual: Vec<&str> = row.columns().collect();
        return Err(Error::schema_mismatch(
            table,
            format!("row has columns {actual:?}, expected {expected:?}"),
        ));
    }
    Ok(())
}

/// Build a RecordBatch from rows, typed by the table schema
pub fn rows_to_arrow(
    rows: &[Row],
    schema: &SchemaDescriptor,
    arrow_schema: &SchemaRef,
) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.len());

    for (column, field) in schema.columns().iter().zip(arrow_schema.fields()) {
        let values: Vec<Option<&JsonValue>> = rows
            .iter()
            .map(|row| row.get(&column.name).filter(|v| !v.is_null()))
            .collect();
        columns.push(build_array(column, field.data_type(), &values)?);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        Arc::clone(arrow_schema),
        columns,
        &options,
    )?)
}

fn build_array(
    column: &ColumnSchema,
    data_type: &DataType,
    values: &[Option<&JsonValue>],
) -> Result<ArrayRef> {
    let invalid = |value: &JsonValue| Error::invalid_value(&column.name, &column.column_type, value);

    match data_type {
        DataType::Boolean => {
            let arr = values
                .iter()
                .map(|v| v.map(|v| to_bool(v).ok_or_else(|| invalid(v))).transpose())
                .collect::<Result<BooleanArray>>()?;
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr = values
                .iter()
                .map(|v| v.map(|v| to_i64(v).ok_or_else(|| invalid(v))).transpose())
                .collect::<Result<Int64Array>>()?;
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr = values
                .iter()
                .map(|v| v.map(|v| to_f64(v).ok_or_else(|| invalid(v))).transpose())
                .collect::<Result<Float64Array>>()?;
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr = values
                .iter()
                .map(|v| v.map(|v| to_text(v).ok_or_else(|| invalid(v))).transpose())
                .collect::<Result<StringArray>>()?;
            Ok(Arc::new(arr))
        }

        DataType::Timestamp(TimeUnit::Microsecond, tz) => {
            let micros = values
                .iter()
                .map(|v| v.map(|v| to_timestamp_micros(v).ok_or_else(|| invalid(v))).transpose())
                .collect::<Result<Vec<Option<i64>>>>()?;
            let arr = TimestampMicrosecondArray::from(micros);
            let arr = match tz {
                Some(tz) => arr.with_timezone(Arc::clone(tz)),
                None => arr,
            };
            Ok(Arc::new(arr))
        }

        DataType::Date32 => {
            let arr = values
                .iter()
                .map(|v| v.map(|v| to_date32(v).ok_or_else(|| invalid(v))).transpose())
                .collect::<Result<Date32Array>>()?;
            Ok(Arc::new(arr))
        }

        other => Err(Error::sink(format!(
            "No array builder for Arrow type {other} (column '{}')",
            column.name
        ))),
    }
}

fn to_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// RFC 3339 strings, `YYYY-MM-DD HH:MM:SS[.f]` (UTC), or epoch seconds
fn to_timestamp_micros(value: &JsonValue) -> Option<i64> {
    match value {
        #[allow(clippy::cast_possible_truncation)]
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|secs| secs.checked_mul(1_000_000))
            .or_else(|| n.as_f64().map(|secs| (secs * 1_000_000.0).round() as i64)),
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.timestamp_micros());
            }
            let naive = s.strip_suffix(" UTC").unwrap_or(s);
            NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|ts| ts.and_utc().timestamp_micros())
        }
        _ => None,
    }
}

fn to_date32(value: &JsonValue) -> Option<i32> {
    let s = value.as_str()?;
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    i32::try_from(date.signed_duration_since(epoch).num_days()).ok()
}
