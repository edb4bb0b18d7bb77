//! Percentile calculations for cycle-count samples.
//!
//! Percentiles use the "midpoint" rule: when the requested rank falls
//! between two order statistics, the result is their arithmetic mean rather
//! than a linear blend weighted by the fractional rank.

use serde::{Deserialize, Serialize};

use super::{sorted_copy, Sample};

/// Calculate a percentile using midpoint interpolation.
///
/// # Arguments
///
/// * `samples` - Slice of samples (sorted internally, not mutated)
/// * `p` - Percentile to calculate (0.0 to 100.0)
///
/// # Returns
///
/// * `Some(value)` - The percentile value
/// * `None` - If samples is empty or p is out of range
///
/// # Examples
///
/// ```
/// use cycle_stats::stats::percentiles::percentile;
///
/// let data: Vec<u64> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
/// // rank 2.25 lies between 3 and 4
/// assert_eq!(percentile(&data, 25.0), Some(3.5));
/// assert_eq!(percentile(&data, 50.0), Some(5.5));
/// ```
pub fn percentile<T: Sample>(samples: &[T], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let sorted = sorted_copy(samples);
    Some(percentile_of_sorted(&sorted, p))
}

/// Midpoint percentile over an already sorted, non-empty slice.
pub(crate) fn percentile_of_sorted<T: Sample>(sorted: &[T], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower_index = rank.floor() as usize;
    let upper_index = rank.ceil() as usize;

    if lower_index == upper_index {
        sorted[lower_index].to_f64()
    } else {
        (sorted[lower_index].to_f64() + sorted[upper_index].to_f64()) / 2.0
    }
}

/// Five-number summary used for box-plot style output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuartileSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl QuartileSummary {
    /// Compute the five-number summary, or `None` for an empty slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use cycle_stats::stats::percentiles::QuartileSummary;
    ///
    /// let data: Vec<u64> = vec![1, 2, 3, 4, 100];
    /// let summary = QuartileSummary::from_samples(&data).unwrap();
    /// assert_eq!(summary.median, 3.0);
    /// assert_eq!(summary.iqr(), 2.0);
    /// ```
    pub fn from_samples<T: Sample>(samples: &[T]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let sorted = sorted_copy(samples);
        let count = sorted.len();

        Some(QuartileSummary {
            count,
            min: sorted[0].to_f64(),
            q1: percentile_of_sorted(&sorted, 25.0),
            median: percentile_of_sorted(&sorted, 50.0),
            q3: percentile_of_sorted(&sorted, 75.0),
            max: sorted[count - 1].to_f64(),
        })
    }

    /// Interquartile range (Q3 - Q1).
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}
