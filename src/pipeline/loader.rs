//! Dataset loader for CSV subject tables

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde_json::{Map, Number, Value};

use super::error::GroupingError;
use super::subject::Subject;

/// Cell tokens read as missing, in addition to empty fields.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn na_null_values() -> NullValues {
    NullValues::AllColumns(NA_TOKENS.iter().map(|&token| token.into()).collect())
}

/// Load a subject table from a CSV file with a header row.
///
/// # Arguments
/// * `path` - Path to the CSV file
/// * `infer_schema_length` - Rows used for dtype inference (0 = full scan)
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    check_extension(path)?;

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(schema_length)
        .with_null_values(Some(na_null_values()))
        .finish()
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    Ok(df)
}

/// Parse an in-memory CSV document (header row first).
pub fn load_csv_str(text: &str) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_null_values(Some(na_null_values())))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes()))
        .finish()
        .context("Failed to parse CSV data")?;
    Ok(df)
}

/// Read only the header of a CSV file.
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    check_extension(path)?;

    let schema = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        .collect_schema()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?;

    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" | "txt" => Ok(()),
        _ => anyhow::bail!(
            "Unsupported file format: '{}'. Subject tables must be CSV",
            extension
        ),
    }
}

/// Convert every row of `df` into a [`Subject`] record.
pub fn subjects_from_frame(df: &DataFrame) -> Result<Vec<Subject>, GroupingError> {
    let columns = df.get_columns();
    let mut subjects = Vec::with_capacity(df.height());

    for row in 0..df.height() {
        let mut fields = Map::with_capacity(columns.len());
        for column in columns {
            let value = any_value_to_json(column.get(row)?);
            fields.insert(column.name().to_string(), value);
        }
        subjects.push(Subject::new(fields));
    }

    Ok(subjects)
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
