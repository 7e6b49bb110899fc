//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::StratificationMode;

/// Default directory for stored grouping results.
pub const DEFAULT_STORE_DIR: &str = "stratify_results";

/// Stratify - balanced randomized grouping of experiment subjects
#[derive(Parser, Debug)]
#[command(name = "stratify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace). Defaults to RUST_LOG or warn.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split subjects into balanced groups (best of several randomized attempts)
    Group(GroupArgs),

    /// Refine a stored grouping by extract-and-redistribute trials
    FineTune(FineTuneArgs),

    /// Progressive sampling: redistribute with growing extraction sizes
    Sample(SampleArgs),

    /// Show group statistics of a stored grouping
    Stats(StoreLookupArgs),

    /// List stored grouping results
    List {
        /// Directory holding stored results
        #[arg(long, default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Input CSV file with a header row
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of groups
    #[arg(short, long, default_value = "3", value_parser = validate_positive)]
    pub groups: usize,

    /// Layer (covariate) columns used for stratification, comma-separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub layers: Vec<String>,

    /// Explicit group sizes, comma-separated. Must sum to the usable subject count
    /// (subjects with a value in every layer column).
    #[arg(long, value_delimiter = ',')]
    pub sizes: Vec<usize>,

    /// Randomized attempts; the lowest-variance grouping is kept
    #[arg(long, default_value = "10", value_parser = validate_positive)]
    pub attempts: usize,

    /// How strata are dealt into groups: "shuffled" (default) or "proportional"
    #[arg(long, default_value = "shuffled")]
    pub mode: StratificationMode,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory holding stored results
    #[arg(long, default_value = DEFAULT_STORE_DIR)]
    pub store: PathBuf,

    /// Do not store the result
    #[arg(long, default_value = "false")]
    pub no_save: bool,

    /// Write the result as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of rows to use for schema inference (0 = full scan)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl GroupArgs {
    /// Explicit sizes, `None` when not given.
    pub fn explicit_sizes(&self) -> Option<&[usize]> {
        if self.sizes.is_empty() {
            None
        } else {
            Some(&self.sizes)
        }
    }
}

#[derive(Args, Debug)]
pub struct FineTuneArgs {
    /// Identifier of the stored grouping
    #[arg(long)]
    pub id: String,

    /// Directory holding stored results
    #[arg(long, default_value = DEFAULT_STORE_DIR)]
    pub store: PathBuf,

    /// Redistribution trials per extraction count
    #[arg(long, default_value = "100", value_parser = validate_positive)]
    pub simulations: usize,

    /// Smallest number of subjects extracted from each group
    #[arg(long, default_value = "1")]
    pub min_extract: usize,

    /// Largest number of subjects extracted from each group (inclusive)
    #[arg(long, default_value = "3")]
    pub max_extract: usize,

    /// Store the improved grouping as a new result
    #[arg(long, default_value = "false")]
    pub save: bool,

    /// Write the sweep report as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Input CSV file with a header row
    #[arg(short, long)]
    pub input: PathBuf,

    /// Covariate columns, comma-separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub layers: Vec<String>,

    /// Redistribution trials per iteration
    #[arg(long, default_value = "100", value_parser = validate_positive)]
    pub simulations: usize,

    /// Extraction size of the first iteration
    #[arg(long, default_value = "1")]
    pub sample_size: usize,

    /// Additional iterations, each extracting one more subject per group
    #[arg(long, default_value = "5")]
    pub iterations: usize,

    /// Number of groups in the base grouping
    #[arg(short, long, default_value = "3", value_parser = validate_positive)]
    pub groups: usize,

    /// How strata are dealt into the base grouping
    #[arg(long, default_value = "shuffled")]
    pub mode: StratificationMode,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the sampling report as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of rows to use for schema inference (0 = full scan)
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug)]
pub struct StoreLookupArgs {
    /// Identifier of the stored grouping
    #[arg(long)]
    pub id: String,

    /// Directory holding stored results
    #[arg(long, default_value = DEFAULT_STORE_DIR)]
    pub store: PathBuf,
}

/// Validator for counts that must be at least 1
fn validate_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid non-negative integer", s))?;

    if value == 0 {
        Err("value must be a positive integer".to_string())
    } else {
        Ok(value)
    }
}
