//! Pipeline module - stratified grouping, scoring and refinement

pub mod allocation;
pub mod binning;
pub mod error;
pub mod fine_tune;
pub mod layered;
pub mod loader;
pub mod progressive;
pub mod quality;
pub mod redistribute;
pub mod rng;
pub mod search;
pub mod subject;

pub use allocation::Allocation;
pub use binning::{bin_column, bin_values, stratum_keys, StratumKey, BIN_COUNT};
pub use error::GroupingError;
pub use fine_tune::{fine_tune, FineTuneConfig, FineTuneReport, TrendPoint};
pub use layered::{
    layered_random_grouping, layered_random_grouping_with_mode, StrataPlan, StratificationMode,
};
pub use loader::{get_column_names, load_csv_str, load_dataset, subjects_from_frame};
pub use progressive::{progressive_sampling, SamplingConfig, SamplingIteration, SamplingReport};
pub use quality::{
    group_statistics, quality_score, CovariateStats, CovariateSummary, GroupStatistics,
};
pub use redistribute::{redistribute, redistribute_seeded};
pub use search::{optimal_from_plan, optimal_grouping, ScoredGrouping, SearchConfig, DEFAULT_ATTEMPTS};
pub use subject::{group_label, Grouping, Subject};
