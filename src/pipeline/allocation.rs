//! Group size allocation

use serde::Serialize;

use super::error::{GroupingError, Result};

/// Target size of every output group, in label order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Allocation(Vec<usize>);

impl Allocation {
    /// Equal split of `total` subjects across `group_count` groups.
    ///
    /// The first `total % group_count` groups take one extra subject.
    pub fn equal(total: usize, group_count: usize) -> Result<Self> {
        if group_count == 0 {
            return Err(GroupingError::InvalidGroupCount(group_count));
        }
        let base = total / group_count;
        let remainder = total % group_count;
        Ok(Self(
            (0..group_count)
                .map(|i| base + usize::from(i < remainder))
                .collect(),
        ))
    }

    /// Validate caller-supplied sizes against the group count and subject total.
    pub fn explicit(sizes: &[usize], total: usize, group_count: usize) -> Result<Self> {
        if group_count == 0 {
            return Err(GroupingError::InvalidGroupCount(group_count));
        }
        if sizes.len() != group_count {
            return Err(GroupingError::AllocationLength {
                expected: group_count,
                actual: sizes.len(),
            });
        }
        let requested: usize = sizes.iter().sum();
        if requested != total {
            return Err(GroupingError::AllocationSum {
                requested,
                available: total,
            });
        }
        Ok(Self(sizes.to_vec()))
    }

    /// Mode B when `sizes` is given, mode A otherwise.
    pub fn resolve(sizes: Option<&[usize]>, total: usize, group_count: usize) -> Result<Self> {
        match sizes {
            Some(sizes) => Self::explicit(sizes, total, group_count),
            None => Self::equal(total, group_count),
        }
    }

    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    pub fn group_count(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Flat sequence holding each group index repeated by its size.
    pub fn assignment_slots(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .flat_map(|(group, &size)| std::iter::repeat(group).take(size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_split_ten_into_three() {
        let alloc = Allocation::equal(10, 3).unwrap();
        assert_eq!(alloc.sizes(), &[4, 3, 3]);
        assert_eq!(alloc.total(), 10);
    }

    #[test]
    fn test_equal_split_properties() {
        for total in 0..40 {
            for groups in 1..9 {
                let alloc = Allocation::equal(total, groups).unwrap();
                let sizes = alloc.sizes();
                assert_eq!(sizes.iter().sum::<usize>(), total);
                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1);
                assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }

    #[test]
    fn test_zero_groups_rejected() {
        assert!(matches!(
            Allocation::equal(10, 0),
            Err(GroupingError::InvalidGroupCount(0))
        ));
    }

    #[test]
    fn test_explicit_length_mismatch_reported_before_sum() {
        let err = Allocation::explicit(&[5, 5], 10, 3).unwrap_err();
        assert!(matches!(
            err,
            GroupingError::AllocationLength {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_explicit_sum_mismatch() {
        let err = Allocation::explicit(&[3, 3, 3], 10, 3).unwrap_err();
        assert!(matches!(
            err,
            GroupingError::AllocationSum {
                requested: 9,
                available: 10
            }
        ));
    }

    #[test]
    fn test_assignment_slots() {
        let alloc = Allocation::explicit(&[2, 0, 1], 3, 3).unwrap();
        assert_eq!(alloc.assignment_slots(), vec![0, 0, 2]);
    }
}
