//! Outlier rejection for cycle-count samples.
//!
//! The window is `median ± 1.5 * IQR`, with all three quartiles computed by
//! midpoint interpolation. It is centred on the median rather than placed at
//! the classic Tukey fences `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`.

use serde::{Deserialize, Serialize};

use super::percentiles::percentile_of_sorted;
use super::{sorted_copy, Sample};

/// Half-width of the retention window in units of IQR.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Retention window computed from one sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierWindow {
    /// First quartile (25th percentile)
    pub q1: f64,
    /// Median (50th percentile), the window centre
    pub median: f64,
    /// Third quartile (75th percentile)
    pub q3: f64,
    /// Interquartile range (Q3 - Q1)
    pub iqr: f64,
    /// Smallest retained value (median - 1.5*IQR)
    pub lower: f64,
    /// Largest retained value (median + 1.5*IQR)
    pub upper: f64,
}

impl OutlierWindow {
    /// Compute the window for `samples`.
    ///
    /// Returns `None` for an empty slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use cycle_stats::stats::outliers::OutlierWindow;
    ///
    /// let data: Vec<u64> = vec![1, 2, 3, 4, 100];
    /// let window = OutlierWindow::from_samples(&data).unwrap();
    /// assert_eq!(window.median, 3.0);
    /// assert_eq!((window.lower, window.upper), (0.0, 6.0));
    /// ```
    pub fn from_samples<T: Sample>(samples: &[T]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let sorted = sorted_copy(samples);
        let q1 = percentile_of_sorted(&sorted, 25.0);
        let median = percentile_of_sorted(&sorted, 50.0);
        let q3 = percentile_of_sorted(&sorted, 75.0);
        let iqr = q3 - q1;
        let half_width = IQR_MULTIPLIER * iqr;

        Some(OutlierWindow {
            q1,
            median,
            q3,
            iqr,
            lower: median - half_width,
            upper: median + half_width,
        })
    }

    /// Whether `value` lies inside the closed window.
    pub fn contains<T: Sample>(&self, value: T) -> bool {
        let value = value.to_f64();
        value >= self.lower && value <= self.upper
    }

    /// Retained values, in their original order.
    pub fn retain<T: Sample>(&self, samples: &[T]) -> Vec<T> {
        samples
            .iter()
            .copied()
            .filter(|&value| self.contains(value))
            .collect()
    }

    /// Indices of the rejected values in `samples`.
    pub fn outlier_indices<T: Sample>(&self, samples: &[T]) -> Vec<usize> {
        samples
            .iter()
            .enumerate()
            .filter_map(|(i, &value)| (!self.contains(value)).then_some(i))
            .collect()
    }
}

/// Return a new sequence with the outliers of `samples` removed.
///
/// Relative order and duplicates are preserved; the input is untouched.
/// An empty input yields an empty output.
///
/// # Examples
///
/// ```
/// use cycle_stats::stats::outliers::remove_outliers;
///
/// let data: Vec<u64> = vec![1, 2, 3, 4, 100];
/// assert_eq!(remove_outliers(&data), vec![1, 2, 3, 4]);
/// ```
pub fn remove_outliers<T: Sample>(samples: &[T]) -> Vec<T> {
    match OutlierWindow::from_samples(samples) {
        Some(window) => window.retain(samples),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_empty() {
        let empty: [u64; 0] = [];
        assert!(OutlierWindow::from_samples(&empty).is_none());
        assert!(remove_outliers(&empty).is_empty());
    }

    #[test]
    fn test_single_high_outlier() {
        let samples = vec![1u64, 2, 3, 4, 100];
        let window = OutlierWindow::from_samples(&samples).unwrap();

        assert_eq!(window.q1, 2.0);
        assert_eq!(window.median, 3.0);
        assert_eq!(window.q3, 4.0);
        assert_eq!(window.iqr, 2.0);
        assert_eq!(window.outlier_indices(&samples), vec![4]);
        assert_eq!(remove_outliers(&samples), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_single_low_outlier() {
        let samples = vec![1u64, 1000, 1001, 1002, 1003, 1004];
        let filtered = remove_outliers(&samples);

        assert_eq!(filtered, vec![1000, 1001, 1002, 1003, 1004]);
    }

    #[test]
    fn test_window_centred_on_median() {
        // Q1 = 10, median = 10, Q3 = 20: Tukey fences would be [-5, 35],
        // the median-centred window is [-5, 25].
        let samples = vec![10u64, 10, 10, 10, 20, 20, 30];
        let window = OutlierWindow::from_samples(&samples).unwrap();

        assert_eq!(window.q1, 10.0);
        assert_eq!(window.median, 10.0);
        assert_eq!(window.q3, 20.0);
        assert_eq!(window.upper, 25.0);
        assert_eq!(remove_outliers(&samples), vec![10, 10, 10, 10, 20, 20]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        // median 4, Q1 2, Q3 6 -> window [-2, 10]
        let samples = vec![10u64, 2, 4, 6, 0];
        let window = OutlierWindow::from_samples(&samples).unwrap();

        assert_eq!(window.upper, 10.0);
        assert!(window.contains(10u64));
        assert_eq!(remove_outliers(&samples), samples);
    }

    #[test]
    fn test_all_same_values() {
        let samples = vec![5u64; 8];
        let window = OutlierWindow::from_samples(&samples).unwrap();

        assert_eq!(window.iqr, 0.0);
        assert_eq!(remove_outliers(&samples).len(), 8);
    }

    #[test]
    fn test_zero_iqr_rejects_everything_off_median() {
        let samples = vec![7u64, 7, 7, 7, 7, 8, 6];
        assert_eq!(remove_outliers(&samples), vec![7, 7, 7, 7, 7]);
    }

    #[test]
    fn test_two_distinct_samples_are_both_rejected() {
        // Every quartile is the midpoint 0.5 and the window collapses onto it
        let samples = vec![0u64, 1];
        let window = OutlierWindow::from_samples(&samples).unwrap();

        assert_eq!((window.lower, window.upper), (0.5, 0.5));
        assert!(remove_outliers(&samples).is_empty());
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let samples = vec![5u64, 3, 900, 5, 4, 3, 4];
        assert_eq!(remove_outliers(&samples), vec![5, 3, 5, 4, 3, 4]);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let samples = vec![9u64, 1, 5, 500];
        let before = samples.clone();
        let _ = remove_outliers(&samples);
        assert_eq!(samples, before);
    }

    #[test]
    fn test_float_samples() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert_eq!(remove_outliers(&samples), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: filtering never grows the sequence and every survivor is in the window
        #[test]
        fn survivors_lie_in_window(samples in prop::collection::vec(0u64..1_000_000, 1..200)) {
            let window = OutlierWindow::from_samples(&samples).unwrap();
            let filtered = remove_outliers(&samples);

            prop_assert!(filtered.len() <= samples.len());
            for value in &filtered {
                let v = *value as f64;
                prop_assert!(window.median - IQR_MULTIPLIER * window.iqr <= v);
                prop_assert!(v <= window.median + IQR_MULTIPLIER * window.iqr);
            }
        }

        /// Property: survivors keep their relative input order
        #[test]
        fn filtering_is_order_preserving(samples in prop::collection::vec(0u64..10_000, 1..200)) {
            let filtered = remove_outliers(&samples);

            let mut remaining = samples.iter();
            for value in &filtered {
                prop_assert!(remaining.any(|candidate| candidate == value));
            }
        }

        /// Property: with three or more samples some value between Q1 and Q3 survives
        #[test]
        fn filtered_output_is_never_empty(samples in prop::collection::vec(any::<u32>(), 3..100)) {
            prop_assert!(!remove_outliers(&samples).is_empty());
        }
    }
}
