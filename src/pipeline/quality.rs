//! Group statistics and the balance quality score
//!
//! The score of a grouping is the population variance of every
//! (group, covariate) mean plus the sum of every (group, covariate)
//! within-group variance. Lower is better. A grouping with no computable
//! statistic scores `f64::INFINITY`.

use serde::Serialize;

use super::subject::{group_label, Grouping};

/// Mean and variance of one covariate within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovariateStats {
    pub group: String,
    pub covariate: String,
    /// Members whose value for the covariate is numeric
    pub count: usize,
    pub mean: f64,
    /// Population variance
    pub variance: f64,
}

/// Statistics for every (group, covariate) pair that has numeric values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GroupStatistics {
    entries: Vec<CovariateStats>,
}

impl GroupStatistics {
    pub fn entries(&self) -> &[CovariateStats] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, group: &str, covariate: &str) -> Option<&CovariateStats> {
        self.entries
            .iter()
            .find(|e| e.group == group && e.covariate == covariate)
    }

    /// Entries for one covariate across groups.
    pub fn for_covariate<'a>(&'a self, covariate: &'a str) -> impl Iterator<Item = &'a CovariateStats> {
        self.entries.iter().filter(move |e| e.covariate == covariate)
    }

    /// Between-group variance of means plus total within-group variance.
    pub fn score(&self) -> f64 {
        if self.entries.is_empty() {
            return f64::INFINITY;
        }
        let means: Vec<f64> = self.entries.iter().map(|e| e.mean).collect();
        let within: f64 = self.entries.iter().map(|e| e.variance).sum();
        population_variance(&means).unwrap_or(0.0) + within
    }

    /// Per covariate: mean of group means and mean of group variances.
    pub fn covariate_summaries(&self, covariates: &[String]) -> Vec<CovariateSummary> {
        covariates
            .iter()
            .filter_map(|covariate| {
                let means: Vec<f64> = self.for_covariate(covariate).map(|e| e.mean).collect();
                let variances: Vec<f64> = self.for_covariate(covariate).map(|e| e.variance).collect();
                Some(CovariateSummary {
                    covariate: covariate.clone(),
                    mean_of_means: mean(&means)?,
                    mean_of_variances: mean(&variances)?,
                })
            })
            .collect()
    }
}

/// Aggregate of one covariate over all groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovariateSummary {
    pub covariate: String,
    pub mean_of_means: f64,
    pub mean_of_variances: f64,
}

/// Compute per-group, per-covariate statistics.
///
/// Only values that coerce to a finite number are counted; a group with no
/// numeric value for a covariate contributes no entry.
pub fn group_statistics<S: AsRef<str>>(grouping: &Grouping, covariates: &[S]) -> GroupStatistics {
    let mut entries = Vec::new();

    for (index, members) in grouping.groups().iter().enumerate() {
        for covariate in covariates {
            let covariate = covariate.as_ref();
            let values: Vec<f64> = members.iter().filter_map(|s| s.numeric(covariate)).collect();
            let (Some(m), Some(v)) = (mean(&values), population_variance(&values)) else {
                continue;
            };
            entries.push(CovariateStats {
                group: group_label(index),
                covariate: covariate.to_string(),
                count: values.len(),
                mean: m,
                variance: v,
            });
        }
    }

    GroupStatistics { entries }
}

/// Quality score of `grouping` over `covariates` (lower is better).
pub fn quality_score<S: AsRef<str>>(grouping: &Grouping, covariates: &[S]) -> f64 {
    group_statistics(grouping, covariates).score()
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by n), `None` for an empty slice.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}
