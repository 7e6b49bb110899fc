//! Equal-width binning of covariates and composite stratum keys
//!
//! Each layering covariate is cut into [`BIN_COUNT`] equal-width bins over its
//! observed range. Bins are right-closed: a value sitting exactly on an
//! internal edge belongs to the lower bin, the minimum lands in bin 0 and the
//! maximum in the last bin. A collapsed range (all values equal) puts every
//! subject in bin 0.

use polars::prelude::*;

use super::error::{GroupingError, Result};

/// Number of equal-width bins per covariate.
pub const BIN_COUNT: usize = 5;

/// Composite stratum key: one bin index per covariate, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StratumKey(Vec<usize>);

impl StratumKey {
    pub fn bins(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for StratumKey {
    fn from(bins: Vec<usize>) -> Self {
        Self(bins)
    }
}

/// Bin a numeric polars column.
///
/// Nulls and NaNs map to `None`. Fails for non-numeric dtypes and for columns
/// with no usable value.
pub fn bin_column(column: &Column, bin_count: usize) -> Result<Vec<Option<usize>>> {
    let name = column.name().to_string();
    if !column.dtype().is_primitive_numeric() {
        return Err(GroupingError::NonNumericColumn(name));
    }

    let float_col = column.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = float_col
        .f64()?
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();

    bin_values(&name, &values, bin_count)
}

/// Assign each value to one of `bin_count` equal-width bins.
///
/// # Arguments
/// * `name` - Column name, used in error messages
/// * `values` - One entry per subject; `None` stays `None`
/// * `bin_count` - Number of bins (must be positive)
pub fn bin_values(name: &str, values: &[Option<f64>], bin_count: usize) -> Result<Vec<Option<usize>>> {
    if bin_count == 0 {
        return Err(GroupingError::invalid("bin_count must be positive"));
    }

    let (min, max) = values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .ok_or_else(|| GroupingError::EmptyCovariate(name.to_string()))?;

    if min == max {
        return Ok(values
            .iter()
            .map(|v| v.filter(|x| x.is_finite()).map(|_| 0))
            .collect());
    }

    let width = (max - min) / bin_count as f64;
    let internal_edges: Vec<f64> = (1..bin_count).map(|k| min + width * k as f64).collect();

    Ok(values
        .iter()
        .map(|v| {
            v.filter(|x| x.is_finite()).map(|x| {
                // Rounded edges may reach the maximum; it always closes the last bin.
                if x >= max {
                    bin_count - 1
                } else {
                    internal_edges.iter().take_while(|&&edge| edge < x).count()
                }
            })
        })
        .collect())
}

/// Combine aligned per-covariate bins into one key per subject.
///
/// A subject whose bin is undefined for any covariate gets `None` and is
/// excluded from grouping.
pub fn stratum_keys(row_count: usize, binned: &[Vec<Option<usize>>]) -> Vec<Option<StratumKey>> {
    (0..row_count)
        .map(|row| {
            binned
                .iter()
                .map(|bins| bins.get(row).copied().flatten())
                .collect::<Option<Vec<usize>>>()
                .map(StratumKey)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_equal_width_bins() {
        let bins = bin_values("w", &some(&[0.0, 1.0, 3.0, 5.0, 7.0, 9.0, 10.0]), 5).unwrap();
        assert_eq!(
            bins,
            vec![Some(0), Some(0), Some(1), Some(2), Some(3), Some(4), Some(4)]
        );
    }

    #[test]
    fn test_boundary_goes_to_lower_bin() {
        // Edges at 2, 4, 6, 8
        let bins = bin_values("w", &some(&[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]), 5).unwrap();
        assert_eq!(
            bins,
            vec![Some(0), Some(0), Some(1), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn test_maximum_lands_in_last_bin_despite_rounding() {
        // Edges round onto both the minimum and the maximum at this magnitude
        let bins = bin_values("big", &some(&[1e16, 1e16 + 2.0]), 5).unwrap();
        assert_eq!(bins, vec![Some(0), Some(4)]);
    }

    #[test]
    fn test_constant_column_single_bin() {
        let bins = bin_values("w", &some(&[3.0, 3.0, 3.0]), 5).unwrap();
        assert_eq!(bins, vec![Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let bins = bin_values("w", &[Some(1.0), None, Some(5.0)], 5).unwrap();
        assert_eq!(bins, vec![Some(0), None, Some(4)]);
    }

    #[test]
    fn test_all_missing_is_error() {
        let err = bin_values("w", &[None, None], 5).unwrap_err();
        assert!(matches!(err, GroupingError::EmptyCovariate(name) if name == "w"));
    }

    #[test]
    fn test_bin_column_rejects_text() {
        let df = df! { "name" => ["a", "b"] }.unwrap();
        let err = bin_column(df.column("name").unwrap(), BIN_COUNT).unwrap_err();
        assert!(matches!(err, GroupingError::NonNumericColumn(_)));
    }

    #[test]
    fn test_bin_column_integer_and_nan() {
        let df = df! {
            "age" => [1i64, 3, 5],
            "weight" => [Some(1.0f64), Some(f64::NAN), Some(2.0)],
        }
        .unwrap();
        assert_eq!(
            bin_column(df.column("age").unwrap(), 2).unwrap(),
            vec![Some(0), Some(0), Some(1)]
        );
        assert_eq!(
            bin_column(df.column("weight").unwrap(), 5).unwrap(),
            vec![Some(0), None, Some(4)]
        );
    }

    #[test]
    fn test_stratum_keys_drop_incomplete_rows() {
        let binned = vec![
            vec![Some(0), Some(1), None],
            vec![Some(2), Some(2), Some(3)],
        ];
        let keys = stratum_keys(3, &binned);
        assert_eq!(keys[0], Some(StratumKey::from(vec![0, 2])));
        assert_eq!(keys[1], Some(StratumKey::from(vec![1, 2])));
        assert_eq!(keys[2], None);
    }
}
