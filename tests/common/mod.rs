//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

use stratify::pipeline::{rng, Grouping};

/// Thirty subjects with two numeric covariates and a text column.
///
/// - `id`: unique `S01..S30`
/// - `weight`: spread over 20..=32
/// - `glucose`: spread over 5.0..=8.0
/// - `cage`: non-numeric, cycles `A`, `B`, `C`
pub fn create_subject_dataframe() -> DataFrame {
    let rows = 30;
    let ids: Vec<String> = (1..=rows).map(|i| format!("S{:02}", i)).collect();
    let weight: Vec<f64> = (0..rows).map(|i| 20.0 + ((i * 7) % 13) as f64).collect();
    let glucose: Vec<f64> = (0..rows).map(|i| 5.0 + ((i * 3) % 7) as f64 * 0.5).collect();
    let cage: Vec<&str> = (0..rows).map(|i| ["A", "B", "C"][i % 3]).collect();

    df! {
        "id" => ids,
        "weight" => weight,
        "glucose" => glucose,
        "cage" => cage,
    }
    .unwrap()
}

/// Ten subjects, two of which have no `weight`.
pub fn create_missing_subject_dataframe() -> DataFrame {
    df! {
        "id" => ["M1", "M2", "M3", "M4", "M5", "M6", "M7", "M8", "M9", "M10"],
        "weight" => [Some(21.0f64), None, Some(25.0), Some(22.5), None, Some(30.0), Some(28.0), Some(24.0), Some(26.5), Some(23.0)],
    }
    .unwrap()
}

/// Write `content` to `name` inside a fresh temporary directory.
pub fn create_temp_csv(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// CSV rendition of [`create_subject_dataframe`].
pub fn subject_csv() -> String {
    let mut df = create_subject_dataframe();
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer).finish(&mut df).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Deterministic random stream.
pub fn test_rng(seed: u64) -> rng::TrialRng {
    rng::seeded(seed)
}

/// Every `id` value in the grouping.
pub fn ids(grouping: &Grouping) -> BTreeSet<String> {
    grouping
        .subjects()
        .map(|s| s.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string())
        .collect()
}

/// `id` values of one group.
pub fn group_ids(grouping: &Grouping, index: usize) -> BTreeSet<String> {
    grouping
        .members(index)
        .unwrap_or_default()
        .iter()
        .map(|s| s.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string())
        .collect()
}
