//! Statistical analysis of cycle-count samples
//!
//! Pure functions over immutable sample slices: midpoint-interpolated
//! percentiles, the median-centred IQR outlier filter, and distribution
//! summaries (mean, population standard deviation, ECDF).
//!
//! # Examples
//!
//! ```
//! use cycle_stats::stats::{remove_outliers, DistributionSummary, QuartileSummary};
//!
//! let samples: Vec<u64> = vec![1, 2, 3, 4, 100];
//!
//! let filtered = remove_outliers(&samples);
//! assert_eq!(filtered, vec![1, 2, 3, 4]);
//!
//! let summary = DistributionSummary::from_samples(&filtered).unwrap();
//! assert_eq!(summary.mean, 2.5);
//!
//! let quartiles = QuartileSummary::from_samples(&filtered).unwrap();
//! println!("median: {}, IQR: {}", quartiles.median, quartiles.iqr());
//! ```

pub mod distribution;
pub mod outliers;
pub mod percentiles;

pub use distribution::{mean, population_std_dev, DistributionSummary, Ecdf, EcdfPoint};
pub use outliers::{remove_outliers, OutlierWindow, IQR_MULTIPLIER};
pub use percentiles::{percentile, QuartileSummary};

/// A numeric sample value the statistics functions accept.
pub trait Sample: Copy + PartialOrd {
    fn to_f64(self) -> f64;
}

impl Sample for u64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for u32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for i64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

pub(crate) fn sorted_copy<T: Sample>(samples: &[T]) -> Vec<T> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}
