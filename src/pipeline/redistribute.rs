//! Extract-and-redistribute perturbation of an existing grouping

use rand::seq::SliceRandom;
use rand::Rng;

use super::error::{GroupingError, Result};
use super::rng::from_optional_seed;
use super::subject::{Grouping, Subject};

/// Pull `extract_count` random members out of every group, pool and shuffle
/// them, then deal the pool back round-robin starting at `group_1`.
///
/// A group smaller than `extract_count` gives up all its members.
/// `group_count` may exceed the number of existing groups (the extra groups
/// start empty) but may not be smaller, since that would orphan the kept
/// members of the trailing groups. The input grouping is left untouched.
pub fn redistribute<R: Rng + ?Sized>(
    grouping: &Grouping,
    extract_count: usize,
    group_count: usize,
    rng: &mut R,
) -> Result<Grouping> {
    if group_count == 0 {
        return Err(GroupingError::InvalidGroupCount(group_count));
    }
    if group_count < grouping.len() {
        return Err(GroupingError::invalid(format!(
            "group_count {} is smaller than the {} groups being redistributed",
            group_count,
            grouping.len()
        )));
    }

    let mut groups: Vec<Vec<Subject>> = Vec::with_capacity(group_count);
    let mut pool: Vec<Subject> = Vec::new();

    for members in grouping.groups() {
        let mut members = members.clone();
        members.shuffle(rng);
        let keep = members.len().saturating_sub(extract_count);
        pool.extend(members.split_off(keep));
        groups.push(members);
    }
    groups.resize_with(group_count, Vec::new);

    pool.shuffle(rng);
    for (i, subject) in pool.into_iter().enumerate() {
        groups[i % group_count].push(subject);
    }

    Ok(Grouping::new(groups))
}

/// [`redistribute`] with its own generator: reproducible when `seed` is
/// given, entropy-seeded otherwise.
pub fn redistribute_seeded(
    grouping: &Grouping,
    extract_count: usize,
    group_count: usize,
    seed: Option<u64>,
) -> Result<Grouping> {
    redistribute(grouping, extract_count, group_count, &mut from_optional_seed(seed))
}
