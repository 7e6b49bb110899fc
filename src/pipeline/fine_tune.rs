//! Fine-tuning sweep over extraction counts
//!
//! For each extraction count in an inclusive range, many seeded
//! redistribution trials are scored and the best one kept. The best grouping
//! across the whole sweep replaces the original only when it scores strictly
//! lower.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{GroupingError, Result};
use super::quality::quality_score;
use super::redistribute::redistribute_seeded;
use super::search::select_lowest;
use super::subject::Grouping;

/// Settings for [`fine_tune`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineTuneConfig {
    /// Redistribution trials per extraction count
    pub simulation_count: usize,
    pub min_extract: usize,
    /// Inclusive upper bound
    pub max_extract: usize,
}

impl Default for FineTuneConfig {
    fn default() -> Self {
        Self {
            simulation_count: 100,
            min_extract: 1,
            max_extract: 3,
        }
    }
}

impl FineTuneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.simulation_count == 0 {
            return Err(GroupingError::invalid("simulation_count must be at least 1"));
        }
        if self.min_extract > self.max_extract {
            return Err(GroupingError::invalid(format!(
                "min_extract ({}) must not exceed max_extract ({})",
                self.min_extract, self.max_extract
            )));
        }
        if (self.max_extract - self.min_extract).checked_add(1).is_none() {
            return Err(GroupingError::invalid(format!(
                "extract range {}..={} is too wide",
                self.min_extract, self.max_extract
            )));
        }
        Ok(())
    }
}

/// Best result at one extraction count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub extract_count: usize,
    pub best_score: f64,
    /// Original score minus `best_score`
    pub improvement: f64,
}

/// Outcome of a fine-tuning sweep.
#[derive(Debug, Clone, Serialize)]
pub struct FineTuneReport {
    pub original_score: f64,
    /// Best score found, equal to `original_score` when nothing improved
    pub final_score: f64,
    pub improvement: f64,
    /// Extraction count of the improving grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_extract_count: Option<usize>,
    /// Improving grouping, `None` when no trial beat the original
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<Grouping>,
    pub trend: Vec<TrendPoint>,
}

impl FineTuneReport {
    pub fn improved(&self) -> bool {
        self.best.is_some()
    }
}

/// Sweep `config.min_extract..=config.max_extract`, running
/// `config.simulation_count` redistribution trials (seeds `0..simulation_count`)
/// at each extraction count.
///
/// # Arguments
/// * `grouping` - Stored grouping to refine
/// * `group_count` - Group count recorded with the grouping
/// * `covariates` - Columns the quality score is computed over
/// * `config` - Sweep settings
pub fn fine_tune<S: AsRef<str> + Sync>(
    grouping: &Grouping,
    group_count: usize,
    covariates: &[S],
    config: FineTuneConfig,
) -> Result<FineTuneReport> {
    config.validate()?;
    if covariates.is_empty() {
        return Err(GroupingError::EmptyLayers);
    }
    if group_count == 0 {
        return Err(GroupingError::InvalidGroupCount(group_count));
    }
    if group_count < grouping.len() {
        return Err(GroupingError::invalid(format!(
            "group_count {} is smaller than the stored {} groups",
            group_count,
            grouping.len()
        )));
    }

    let original_score = quality_score(grouping, covariates);
    info!(original_score, ?config, "starting fine-tune sweep");

    let mut trend = Vec::new();
    let mut best_score = original_score;
    let mut best: Option<(usize, Grouping)> = None;

    for extract_count in config.min_extract..=config.max_extract {
        let trials: Vec<Option<(f64, Grouping)>> = (0..config.simulation_count)
            .into_par_iter()
            .map(|seed| {
                match redistribute_seeded(grouping, extract_count, group_count, Some(seed as u64)) {
                    Ok(candidate) => Some((quality_score(&candidate, covariates), candidate)),
                    Err(e) => {
                        warn!(extract_count, seed, error = %e, "redistribution trial failed, skipping");
                        None
                    }
                }
            })
            .collect();

        let Some((score, candidate)) = select_lowest(trials.into_iter().flatten()) else {
            warn!(extract_count, "no redistribution trial succeeded");
            continue;
        };

        debug!(extract_count, score, "best trial at extraction count");
        trend.push(TrendPoint {
            extract_count,
            best_score: score,
            improvement: improvement(original_score, score),
        });

        if score < best_score {
            best_score = score;
            best = Some((extract_count, candidate));
        }
    }

    let (best_extract_count, best) = match best {
        Some((e, g)) => (Some(e), Some(g)),
        None => (None, None),
    };

    info!(
        original_score,
        final_score = best_score,
        improved = best.is_some(),
        "fine-tune sweep finished"
    );

    Ok(FineTuneReport {
        original_score,
        final_score: best_score,
        improvement: improvement(original_score, best_score),
        best_extract_count,
        best,
        trend,
    })
}

/// Score drop from `original` to `candidate`; zero when either is the
/// non-finite sentinel.
fn improvement(original: f64, candidate: f64) -> f64 {
    if original.is_finite() && candidate.is_finite() {
        original - candidate
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(FineTuneConfig::default().validate().is_ok());
        let zero = FineTuneConfig {
            simulation_count: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        let inverted = FineTuneConfig {
            min_extract: 4,
            max_extract: 2,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        let unbounded = FineTuneConfig {
            min_extract: 0,
            max_extract: usize::MAX,
            ..Default::default()
        };
        assert!(unbounded.validate().is_err());
    }

    #[test]
    fn test_degenerate_grouping_reports_zero_improvement() {
        let grouping: Grouping = serde_json::from_value(serde_json::json!({
            "group_1": [{"w": "x"}],
            "group_2": [{"w": "y"}],
        }))
        .unwrap();
        let config = FineTuneConfig {
            simulation_count: 4,
            ..Default::default()
        };

        let report = fine_tune(&grouping, 2, &["w"], config).unwrap();
        assert_eq!(report.original_score, f64::INFINITY);
        assert_eq!(report.final_score, f64::INFINITY);
        assert_eq!(report.improvement, 0.0);
        assert!(report.best.is_none());
        assert_eq!(report.trend.len(), 3);
        assert!(report.trend.iter().all(|p| p.improvement == 0.0));
    }

    #[test]
    fn test_improvement_ignores_sentinel() {
        assert_eq!(improvement(5.0, 3.0), 2.0);
        assert_eq!(improvement(f64::INFINITY, 3.0), 0.0);
        assert_eq!(improvement(5.0, f64::INFINITY), 0.0);
    }
}
