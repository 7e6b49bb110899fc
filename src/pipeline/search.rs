//! Best-of-N layered grouping search

use polars::prelude::DataFrame;
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::allocation::Allocation;
use super::error::{GroupingError, Result};
use super::layered::{StrataPlan, StratificationMode};
use super::quality::quality_score;
use super::rng::{seeded, trial_seeds};
use super::subject::Grouping;

/// Default number of grouping attempts.
pub const DEFAULT_ATTEMPTS: usize = 10;

/// A grouping together with its quality score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredGrouping {
    pub grouping: Grouping,
    pub score: f64,
    /// Zero-based attempt that produced this grouping
    pub attempt: usize,
}

/// Settings for [`optimal_grouping`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub attempts: usize,
    pub mode: StratificationMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            mode: StratificationMode::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(GroupingError::invalid("attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Run the layered grouping `config.attempts` times and keep the lowest score.
///
/// Input validation happens once, before any attempt, and its errors are
/// returned directly. An attempt that fails afterwards is logged and skipped.
/// `Ok(None)` means no attempt produced a grouping; callers should treat it
/// as a failure rather than an empty result.
pub fn optimal_grouping<S: AsRef<str>, R: Rng + ?Sized>(
    df: &DataFrame,
    group_count: usize,
    layers: &[S],
    sizes: Option<&[usize]>,
    config: SearchConfig,
    rng: &mut R,
) -> Result<Option<ScoredGrouping>> {
    if df.height() == 0 {
        return Err(GroupingError::EmptyTable);
    }
    if layers.is_empty() {
        return Err(GroupingError::EmptyLayers);
    }
    if group_count == 0 {
        return Err(GroupingError::InvalidGroupCount(group_count));
    }
    config.validate()?;

    let plan = StrataPlan::prepare(df, layers)?;
    Allocation::resolve(sizes, plan.usable_count(), group_count)?;

    Ok(optimal_from_plan(&plan, group_count, sizes, config, rng))
}

/// Best-of-N search over an already prepared [`StrataPlan`].
pub fn optimal_from_plan<R: Rng + ?Sized>(
    plan: &StrataPlan,
    group_count: usize,
    sizes: Option<&[usize]>,
    config: SearchConfig,
    rng: &mut R,
) -> Option<ScoredGrouping> {
    let seeds = trial_seeds(rng, config.attempts);
    let covariates = plan.layers();

    let candidates: Vec<Option<(f64, Grouping)>> = seeds
        .par_iter()
        .enumerate()
        .map(|(attempt, &seed)| {
            match plan.deal(group_count, sizes, config.mode, &mut seeded(seed)) {
                Ok(grouping) => {
                    let score = quality_score(&grouping, covariates);
                    debug!(attempt, score, "grouping attempt scored");
                    Some((score, grouping))
                }
                Err(e) => {
                    warn!(attempt, error = %e, "grouping attempt failed, skipping");
                    None
                }
            }
        })
        .collect();

    let best = select_lowest(
        candidates
            .into_iter()
            .enumerate()
            .filter_map(|(attempt, c)| c.map(|(score, g)| (score, (attempt, g)))),
    );

    match best {
        Some((score, (attempt, grouping))) => {
            info!(attempts = config.attempts, best_attempt = attempt, score, "grouping search finished");
            Some(ScoredGrouping {
                grouping,
                score,
                attempt,
            })
        }
        None => {
            warn!(attempts = config.attempts, "every grouping attempt failed");
            None
        }
    }
}

/// The candidate with the numerically lowest score; ties keep the earliest.
pub fn select_lowest<T>(candidates: impl IntoIterator<Item = (f64, T)>) -> Option<(f64, T)> {
    let mut best: Option<(f64, T)> = None;
    for (score, item) in candidates {
        let better = match &best {
            None => true,
            Some((best_score, _)) => score < *best_score,
        };
        if better {
            best = Some((score, item));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_lowest_picks_minimum() {
        let picked = select_lowest(vec![(3.0, "a"), (1.5, "b"), (2.0, "c")]);
        assert_eq!(picked, Some((1.5, "b")));
    }

    #[test]
    fn test_select_lowest_tie_keeps_first() {
        let picked = select_lowest(vec![(1.0, "a"), (1.0, "b")]);
        assert_eq!(picked, Some((1.0, "a")));
    }

    #[test]
    fn test_select_lowest_prefers_finite_over_infinite() {
        let picked = select_lowest(vec![(f64::INFINITY, "a"), (9.0, "b")]);
        assert_eq!(picked, Some((9.0, "b")));
        assert_eq!(select_lowest(Vec::<(f64, u8)>::new()), None);
    }
}
