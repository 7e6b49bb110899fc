//! Progressive sampling: growing extraction sizes against one base grouping

use polars::prelude::DataFrame;
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{GroupingError, Result};
use super::layered::{layered_random_grouping_with_mode, StratificationMode};
use super::quality::{group_statistics, quality_score, CovariateSummary};
use super::redistribute::redistribute;
use super::rng::{seeded, trial_seeds};
use super::search::select_lowest;
use super::subject::Grouping;

/// Settings for [`progressive_sampling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Redistribution trials per iteration
    pub simulation_count: usize,
    /// Extraction size of the first iteration
    pub sample_size: usize,
    /// Extra iterations; sizes run `sample_size..=sample_size + iteration_count`
    pub iteration_count: usize,
    /// Groups in the base grouping
    pub group_count: usize,
    pub mode: StratificationMode,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            simulation_count: 100,
            sample_size: 1,
            iteration_count: 5,
            group_count: 3,
            mode: StratificationMode::default(),
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.simulation_count == 0 {
            return Err(GroupingError::invalid("simulation_count must be at least 1"));
        }
        if self.group_count == 0 {
            return Err(GroupingError::InvalidGroupCount(self.group_count));
        }
        self.last_sample_size()?;
        Ok(())
    }

    /// Extraction size of the final iteration.
    pub fn last_sample_size(&self) -> Result<usize> {
        self.sample_size
            .checked_add(self.iteration_count)
            .ok_or_else(|| {
                GroupingError::invalid(format!(
                    "sample_size ({}) + iteration_count ({}) overflows",
                    self.sample_size, self.iteration_count
                ))
            })
    }
}

/// Aggregates of the winning trial at one extraction size.
#[derive(Debug, Clone, Serialize)]
pub struct SamplingIteration {
    pub sample_size: usize,
    pub best_score: f64,
    /// Per covariate: mean of group means and mean of group variances
    pub covariates: Vec<CovariateSummary>,
    pub grouping: Grouping,
}

/// Outcome of [`progressive_sampling`].
#[derive(Debug, Clone, Serialize)]
pub struct SamplingReport {
    pub initial_score: f64,
    pub initial: Grouping,
    pub iterations: Vec<SamplingIteration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_sample_size: Option<usize>,
    /// Lowest iteration score
    pub min_variance: f64,
    /// First iteration score minus `min_variance`
    pub improvement: f64,
}

impl SamplingReport {
    /// The iteration with the lowest score.
    pub fn best_iteration(&self) -> Option<&SamplingIteration> {
        let size = self.best_sample_size?;
        self.iterations.iter().find(|it| it.sample_size == size)
    }

    /// `(sample_size, score, improvement over first iteration)` per iteration.
    pub fn trend(&self) -> Vec<(usize, f64, f64)> {
        let first = self.iterations.first().map(|it| it.best_score);
        self.iterations
            .iter()
            .map(|it| (it.sample_size, it.best_score, first.map_or(0.0, |f| f - it.best_score)))
            .collect()
    }
}

/// Build one layered grouping of `df`, then for every extraction size from
/// `sample_size` to `sample_size + iteration_count` run
/// `simulation_count` redistribution trials against that same base grouping
/// and record the best.
pub fn progressive_sampling<S: AsRef<str> + Sync, R: Rng + ?Sized>(
    df: &DataFrame,
    covariates: &[S],
    config: SamplingConfig,
    rng: &mut R,
) -> Result<SamplingReport> {
    config.validate()?;

    let initial = layered_random_grouping_with_mode(
        df,
        config.group_count,
        covariates,
        None,
        config.mode,
        rng,
    )?;
    let initial_score = quality_score(&initial, covariates);
    info!(initial_score, ?config, "starting progressive sampling");

    let last_size = config.last_sample_size()?;
    let mut iterations = Vec::new();

    for sample_size in config.sample_size..=last_size {
        let seeds = trial_seeds(rng, config.simulation_count);
        let trials: Vec<Option<(f64, Grouping)>> = seeds
            .par_iter()
            .map(|&seed| {
                match redistribute(&initial, sample_size, config.group_count, &mut seeded(seed)) {
                    Ok(candidate) => Some((quality_score(&candidate, covariates), candidate)),
                    Err(e) => {
                        warn!(sample_size, error = %e, "sampling trial failed, skipping");
                        None
                    }
                }
            })
            .collect();

        let Some((best_score, grouping)) = select_lowest(trials.into_iter().flatten()) else {
            warn!(sample_size, "no sampling trial succeeded");
            continue;
        };

        let names: Vec<String> = covariates.iter().map(|c| c.as_ref().to_string()).collect();
        let summaries = group_statistics(&grouping, &names).covariate_summaries(&names);
        debug!(sample_size, best_score, "sampling iteration finished");

        iterations.push(SamplingIteration {
            sample_size,
            best_score,
            covariates: summaries,
            grouping,
        });
    }

    let best = select_lowest(iterations.iter().map(|it| (it.best_score, it.sample_size)));
    let (min_variance, best_sample_size) = match best {
        Some((score, size)) => (score, Some(size)),
        None => (f64::INFINITY, None),
    };
    let improvement = match iterations.first() {
        Some(first) if min_variance.is_finite() => first.best_score - min_variance,
        _ => 0.0,
    };

    info!(?best_sample_size, min_variance, improvement, "progressive sampling finished");

    Ok(SamplingReport {
        initial_score,
        initial,
        iterations,
        best_sample_size,
        min_variance,
        improvement,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_count_is_three() {
        assert_eq!(SamplingConfig::default().group_count, 3);
    }

    #[test]
    fn test_zero_simulations_rejected() {
        let config = SamplingConfig {
            simulation_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_size_overflow_rejected() {
        let config = SamplingConfig {
            sample_size: usize::MAX,
            iteration_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GroupingError::InvalidParameter { .. })
        ));
        assert_eq!(SamplingConfig::default().last_sample_size().unwrap(), 6);
    }
}
