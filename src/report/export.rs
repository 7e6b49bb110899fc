//! JSON export of grouping and refinement results

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    group_statistics, FineTuneReport, GroupStatistics, Grouping, SamplingReport, ScoredGrouping,
};

/// Metadata about the run that produced an export
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    /// Timestamp of the export (RFC 3339)
    pub timestamp: String,
    /// Stratify version
    pub stratify_version: String,
    /// Subcommand that produced the result
    pub command: String,
    /// Input file, when the run read one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    /// Stored result identifier, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    /// Layer / covariate columns
    pub layers: Vec<String>,
    pub group_count: usize,
    /// Seed of the random stream, when fixed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ExportMetadata {
    pub fn new(command: &str, layers: &[String], group_count: usize) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            stratify_version: env!("CARGO_PKG_VERSION").to_string(),
            command: command.to_string(),
            input_file: None,
            result_id: None,
            layers: layers.to_vec(),
            group_count,
            seed: None,
        }
    }

    pub fn with_input(mut self, input: &Path) -> Self {
        self.input_file = Some(input.display().to_string());
        self
    }

    pub fn with_result_id(mut self, id: impl Into<String>) -> Self {
        self.result_id = Some(id.into());
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Export of a best-of-N grouping
#[derive(Serialize)]
pub struct GroupingExport<'a> {
    pub metadata: ExportMetadata,
    pub score: f64,
    pub attempt: usize,
    pub sizes: Vec<usize>,
    pub statistics: GroupStatistics,
    pub result: &'a Grouping,
}

impl<'a> GroupingExport<'a> {
    pub fn new(metadata: ExportMetadata, scored: &'a ScoredGrouping) -> Self {
        let statistics = group_statistics(&scored.grouping, &metadata.layers);
        Self {
            score: scored.score,
            attempt: scored.attempt,
            sizes: scored.grouping.sizes(),
            statistics,
            result: &scored.grouping,
            metadata,
        }
    }
}

/// Export of a fine-tuning sweep
#[derive(Serialize)]
pub struct FineTuneExport<'a> {
    pub metadata: ExportMetadata,
    #[serde(flatten)]
    pub report: &'a FineTuneReport,
}

/// Export of a progressive sampling run
#[derive(Serialize)]
pub struct SamplingExport<'a> {
    pub metadata: ExportMetadata,
    #[serde(flatten)]
    pub report: &'a SamplingReport,
}

/// Write any export document as pretty-printed JSON.
pub fn write_json<T: Serialize>(document: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)
        .context("Failed to serialize export document to JSON")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write export file: {}", output_path.display()))?;
    Ok(())
}
