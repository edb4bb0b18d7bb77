//! Paired-condition comparison
//!
//! Two operations over a baseline/treatment pair:
//!
//! - **Overhead ratio**: `mean(treatment) / mean(baseline)`.
//! - **Merge and sort**: reorder two aligned sequences together, by the
//!   ascending average of each `(baseline, treatment)` pair, so one curve is
//!   monotonic and the other can be overlaid against it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::stats::{mean, Sample};

/// Overhead of `treatment` relative to `baseline`.
///
/// # Errors
///
/// - [`AnalysisError::EmptySeries`] if either side is empty
/// - [`AnalysisError::DegenerateRatio`] if the baseline mean is exactly zero
///
/// # Examples
///
/// ```
/// use cycle_stats::compare::overhead_ratio;
///
/// let ratio = overhead_ratio(&[10u64, 12], &[15u64, 14]).unwrap();
/// assert!((ratio - 14.5 / 11.0).abs() < 1e-12);
/// ```
pub fn overhead_ratio<T: Sample>(baseline: &[T], treatment: &[T]) -> Result<f64> {
    let baseline_mean = mean(baseline).ok_or(AnalysisError::EmptySeries)?;
    let treatment_mean = mean(treatment).ok_or(AnalysisError::EmptySeries)?;
    ratio_of_means(baseline_mean, treatment_mean)
}

/// Overhead from precomputed means.
pub fn ratio_of_means(baseline_mean: f64, treatment_mean: f64) -> Result<f64> {
    if baseline_mean == 0.0 {
        return Err(AnalysisError::DegenerateRatio);
    }
    Ok(treatment_mean / baseline_mean)
}

fn pair_average(pair: &(f64, f64)) -> f64 {
    (pair.0 + pair.1) / 2.0
}

/// Zip `baseline` and `treatment` into pairs sorted by ascending pair average.
///
/// The sort is stable, so pairs with equal averages keep their input order.
///
/// # Errors
///
/// [`AnalysisError::LengthMismatch`] when the sequences differ in length.
///
/// # Examples
///
/// ```
/// use cycle_stats::compare::merge_and_sort;
///
/// let pairs = merge_and_sort(&[30.0, 10.0], &[20.0, 12.0]).unwrap();
/// assert_eq!(pairs, vec![(10.0, 12.0), (30.0, 20.0)]);
/// ```
pub fn merge_and_sort(baseline: &[f64], treatment: &[f64]) -> Result<Vec<(f64, f64)>> {
    if baseline.len() != treatment.len() {
        return Err(AnalysisError::LengthMismatch {
            baseline: baseline.len(),
            treatment: treatment.len(),
        });
    }

    let mut pairs: Vec<(f64, f64)> = baseline
        .iter()
        .copied()
        .zip(treatment.iter().copied())
        .collect();
    pairs.sort_by(|a, b| {
        pair_average(a)
            .partial_cmp(&pair_average(b))
            .unwrap_or(Ordering::Equal)
    });
    Ok(pairs)
}

/// Both sequences after [`merge_and_sort`], unzipped for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendPair {
    pub baseline: Vec<f64>,
    pub treatment: Vec<f64>,
}

impl TrendPair {
    /// Merge-and-sort two aligned sequences of per-unit means.
    pub fn from_means(baseline: &[f64], treatment: &[f64]) -> Result<Self> {
        let (baseline, treatment): (Vec<f64>, Vec<f64>) =
            merge_and_sort(baseline, treatment)?.into_iter().unzip();
        Ok(Self {
            baseline,
            treatment,
        })
    }

    /// The trend as `(baseline, treatment)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.baseline
            .iter()
            .copied()
            .zip(self.treatment.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.baseline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overhead_for_paired_series() {
        let without = [10u64, 12];
        let with = [15u64, 14];

        let ratio = overhead_ratio(&without, &with).unwrap();
        assert!((ratio - 1.318_181_818).abs() < 1e-9);
    }

    #[test]
    fn test_overhead_zero_baseline_fails() {
        let result = overhead_ratio(&[0u64, 0], &[5u64, 5]);
        assert!(matches!(result, Err(AnalysisError::DegenerateRatio)));
    }

    #[test]
    fn test_overhead_empty_side_fails() {
        let empty: [u64; 0] = [];
        assert!(matches!(
            overhead_ratio(&empty, &[1u64]),
            Err(AnalysisError::EmptySeries)
        ));
        assert!(matches!(
            overhead_ratio(&[1u64], &empty),
            Err(AnalysisError::EmptySeries)
        ));
    }

    #[test]
    fn test_overhead_over_unequal_lengths() {
        // Independently filtered series may differ in length
        let ratio = overhead_ratio(&[10u64, 10, 10, 10], &[20u64, 20]).unwrap();
        assert_eq!(ratio, 2.0);
    }

    #[test]
    fn test_merge_and_sort_already_ascending() {
        let pairs = merge_and_sort(&[10.0, 30.0], &[12.0, 20.0]).unwrap();
        assert_eq!(pairs, vec![(10.0, 12.0), (30.0, 20.0)]);
    }

    #[test]
    fn test_merge_and_sort_reversed_input() {
        let pairs = merge_and_sort(&[30.0, 10.0], &[20.0, 12.0]).unwrap();
        assert_eq!(pairs, vec![(10.0, 12.0), (30.0, 20.0)]);
    }

    #[test]
    fn test_merge_and_sort_key_is_pair_average() {
        // Sorting by baseline alone would put (5, 100) first
        let pairs = merge_and_sort(&[5.0, 20.0], &[100.0, 21.0]).unwrap();
        assert_eq!(pairs, vec![(20.0, 21.0), (5.0, 100.0)]);
    }

    #[test]
    fn test_merge_and_sort_ties_keep_input_order() {
        let pairs = merge_and_sort(&[4.0, 1.0, 3.0, 2.0], &[0.0, 3.0, 1.0, 2.0]).unwrap();
        assert_eq!(pairs, vec![(4.0, 0.0), (1.0, 3.0), (3.0, 1.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_merge_and_sort_length_mismatch() {
        let result = merge_and_sort(&[1.0, 2.0], &[1.0]);
        assert!(matches!(
            result,
            Err(AnalysisError::LengthMismatch {
                baseline: 2,
                treatment: 1
            })
        ));
    }

    #[test]
    fn test_trend_pair_unzips() {
        let trend = TrendPair::from_means(&[30.0, 10.0], &[20.0, 12.0]).unwrap();
        assert_eq!(trend.baseline, vec![10.0, 30.0]);
        assert_eq!(trend.treatment, vec![12.0, 20.0]);
        assert_eq!(trend.pairs().collect::<Vec<_>>(), vec![(10.0, 12.0), (30.0, 20.0)]);
    }

    #[test]
    fn test_trend_pair_empty() {
        let trend = TrendPair::from_means(&[], &[]).unwrap();
        assert!(trend.is_empty());
    }
}
