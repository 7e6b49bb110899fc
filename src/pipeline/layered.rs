//! Layered random grouping
//!
//! Subjects are binned on every numeric layer column, bucketed by their
//! composite stratum key, shuffled and dealt into groups whose sizes follow
//! an [`Allocation`]. Preparation (validation, binning, filtering) is split
//! from dealing so callers can learn the usable subject count before they
//! supply explicit group sizes.

use std::collections::BTreeMap;

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::allocation::Allocation;
use super::binning::{bin_column, stratum_keys, StratumKey, BIN_COUNT};
use super::error::{GroupingError, Result};
use super::loader::subjects_from_frame;
use super::subject::{Grouping, Subject};

/// How stratified subjects are dealt into groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StratificationMode {
    /// Shuffle within each stratum, then shuffle the whole pool once more and
    /// deal it against a shuffled slot sequence.
    #[default]
    Shuffled,
    /// Keep strata contiguous and deal them cyclically across groups, so each
    /// stratum is spread as evenly as the allocation allows.
    Proportional,
}

impl std::fmt::Display for StratificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StratificationMode::Shuffled => write!(f, "shuffled"),
            StratificationMode::Proportional => write!(f, "proportional"),
        }
    }
}

impl std::str::FromStr for StratificationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shuffled" => Ok(StratificationMode::Shuffled),
            "proportional" => Ok(StratificationMode::Proportional),
            _ => Err(format!(
                "Unknown stratification mode: '{}'. Use 'shuffled' or 'proportional'.",
                s
            )),
        }
    }
}

/// Validated, binned and filtered subjects ready to be dealt into groups.
#[derive(Debug, Clone)]
pub struct StrataPlan {
    layers: Vec<String>,
    ignored_layers: Vec<String>,
    strata: BTreeMap<StratumKey, Vec<Subject>>,
    usable: usize,
    dropped: usize,
}

impl StrataPlan {
    /// Validate the layer request against `df` and build the strata.
    ///
    /// Fails on an empty table, an empty layer list, unknown columns (all of
    /// them are reported) or when no requested layer is numeric. Requested
    /// layers that exist but are not numeric are ignored. No randomness is
    /// drawn here.
    pub fn prepare<S: AsRef<str>>(df: &DataFrame, layers: &[S]) -> Result<Self> {
        if df.height() == 0 {
            return Err(GroupingError::EmptyTable);
        }
        if layers.is_empty() {
            return Err(GroupingError::EmptyLayers);
        }

        let mut requested: Vec<String> = Vec::with_capacity(layers.len());
        for layer in layers {
            let name = layer.as_ref().to_string();
            if !requested.contains(&name) {
                requested.push(name);
            }
        }

        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing: Vec<String> = requested
            .iter()
            .filter(|name| !column_names.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GroupingError::UnknownColumns(missing));
        }

        let mut numeric_layers = Vec::new();
        let mut ignored_layers = Vec::new();
        for name in &requested {
            if df.column(name)?.dtype().is_primitive_numeric() {
                numeric_layers.push(name.clone());
            } else {
                ignored_layers.push(name.clone());
            }
        }
        if numeric_layers.is_empty() {
            return Err(GroupingError::NoNumericCovariates(requested));
        }

        let binned = numeric_layers
            .iter()
            .map(|name| bin_column(df.column(name)?, BIN_COUNT))
            .collect::<Result<Vec<_>>>()?;
        let keys = stratum_keys(df.height(), &binned);
        let subjects = subjects_from_frame(df)?;

        let mut strata: BTreeMap<StratumKey, Vec<Subject>> = BTreeMap::new();
        let mut dropped = 0usize;
        for (subject, key) in subjects.into_iter().zip(keys) {
            match key {
                Some(key) => strata.entry(key).or_default().push(subject),
                None => dropped += 1,
            }
        }
        let usable = df.height() - dropped;

        debug!(
            layers = ?numeric_layers,
            ignored = ?ignored_layers,
            strata = strata.len(),
            usable,
            dropped,
            "prepared strata"
        );

        Ok(Self {
            layers: numeric_layers,
            ignored_layers,
            strata,
            usable,
            dropped,
        })
    }

    /// Subjects with a defined stratum key; explicit sizes must sum to this.
    pub fn usable_count(&self) -> usize {
        self.usable
    }

    /// Subjects excluded because a layer value was missing.
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Numeric layers actually used for stratification.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Requested layers skipped because they are not numeric.
    pub fn ignored_layers(&self) -> &[String] {
        &self.ignored_layers
    }

    pub fn strata_count(&self) -> usize {
        self.strata.len()
    }

    /// Deal the usable subjects into `group_count` groups.
    ///
    /// The allocation is resolved (and explicit sizes validated) before any
    /// random draw.
    pub fn deal<R: Rng + ?Sized>(
        &self,
        group_count: usize,
        sizes: Option<&[usize]>,
        mode: StratificationMode,
        rng: &mut R,
    ) -> Result<Grouping> {
        let allocation = Allocation::resolve(sizes, self.usable, group_count)?;

        let groups = match mode {
            StratificationMode::Shuffled => self.deal_shuffled(&allocation, rng),
            StratificationMode::Proportional => self.deal_proportional(&allocation, rng),
        };

        Ok(Grouping::new(groups))
    }

    /// Within-stratum shuffle, then a full shuffle of the combined pool.
    fn deal_shuffled<R: Rng + ?Sized>(&self, allocation: &Allocation, rng: &mut R) -> Vec<Vec<Subject>> {
        let mut slots = allocation.assignment_slots();
        slots.shuffle(rng);

        let mut pool = self.shuffled_strata(rng);
        pool.shuffle(rng);

        let mut groups: Vec<Vec<Subject>> = allocation
            .sizes()
            .iter()
            .map(|&size| Vec::with_capacity(size))
            .collect();
        for (subject, slot) in pool.into_iter().zip(slots) {
            groups[slot].push(subject);
        }
        groups
    }

    /// Strata stay contiguous and are dealt cyclically, skipping full groups.
    fn deal_proportional<R: Rng + ?Sized>(
        &self,
        allocation: &Allocation,
        rng: &mut R,
    ) -> Vec<Vec<Subject>> {
        let group_count = allocation.group_count();
        let mut remaining = allocation.sizes().to_vec();
        let mut groups: Vec<Vec<Subject>> = remaining.iter().map(|&s| Vec::with_capacity(s)).collect();

        let pool = self.shuffled_strata(rng);
        let mut cursor = rng.gen_range(0..group_count);
        for subject in pool {
            let Some(target) = (0..group_count)
                .map(|step| (cursor + step) % group_count)
                .find(|&g| remaining[g] > 0)
            else {
                break;
            };
            remaining[target] -= 1;
            groups[target].push(subject);
            cursor = (target + 1) % group_count;
        }
        groups
    }

    fn shuffled_strata<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Subject> {
        let mut pool = Vec::with_capacity(self.usable);
        for members in self.strata.values() {
            let mut members = members.clone();
            members.shuffle(rng);
            pool.extend(members);
        }
        pool
    }
}

/// Produce one randomized layered grouping of `df`.
///
/// # Arguments
/// * `df` - Subject table
/// * `group_count` - Number of groups (positive)
/// * `layers` - Columns to stratify on; at least one must be numeric
/// * `sizes` - Optional explicit group sizes summing to the usable count
/// * `rng` - Random stream
pub fn layered_random_grouping<S: AsRef<str>, R: Rng + ?Sized>(
    df: &DataFrame,
    group_count: usize,
    layers: &[S],
    sizes: Option<&[usize]>,
    rng: &mut R,
) -> Result<Grouping> {
    layered_random_grouping_with_mode(df, group_count, layers, sizes, StratificationMode::default(), rng)
}

/// [`layered_random_grouping`] with an explicit [`StratificationMode`].
pub fn layered_random_grouping_with_mode<S: AsRef<str>, R: Rng + ?Sized>(
    df: &DataFrame,
    group_count: usize,
    layers: &[S],
    sizes: Option<&[usize]>,
    mode: StratificationMode,
    rng: &mut R,
) -> Result<Grouping> {
    if df.height() == 0 {
        return Err(GroupingError::EmptyTable);
    }
    if layers.is_empty() {
        return Err(GroupingError::EmptyLayers);
    }
    if group_count == 0 {
        return Err(GroupingError::InvalidGroupCount(group_count));
    }

    StrataPlan::prepare(df, layers)?.deal(group_count, sizes, mode, rng)
}
