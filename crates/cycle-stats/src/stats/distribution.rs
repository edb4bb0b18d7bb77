//! Distribution summaries: mean, population standard deviation and the
//! empirical CDF.

use serde::{Deserialize, Serialize};

use super::{sorted_copy, Sample};
use crate::error::{AnalysisError, Result};

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean<T: Sample>(samples: &[T]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&x| x.to_f64()).sum();
    Some(sum / samples.len() as f64)
}

/// Population standard deviation (denominator N), or `None` for an empty slice.
pub fn population_std_dev<T: Sample>(samples: &[T]) -> Option<f64> {
    let mean = mean(samples)?;
    let squared_diffs: f64 = samples
        .iter()
        .map(|&x| (x.to_f64() - mean).powi(2))
        .sum();
    Some((squared_diffs / samples.len() as f64).sqrt())
}

/// One step of an empirical CDF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcdfPoint {
    /// Distinct sample value
    pub value: f64,
    /// Fraction of samples less than or equal to `value`
    pub probability: f64,
}

/// Right-continuous empirical CDF over the distinct sample values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ecdf {
    points: Vec<EcdfPoint>,
}

impl Ecdf {
    /// Build the ECDF of `samples`, or `None` when the slice is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cycle_stats::stats::distribution::Ecdf;
    ///
    /// let ecdf = Ecdf::from_samples(&[3u64, 1, 3, 2]).unwrap();
    /// let ys: Vec<f64> = ecdf.points().iter().map(|p| p.probability).collect();
    /// assert_eq!(ys, vec![0.25, 0.5, 1.0]);
    /// ```
    pub fn from_samples<T: Sample>(samples: &[T]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let sorted = sorted_copy(samples);
        let total = sorted.len() as f64;
        let mut points: Vec<EcdfPoint> = Vec::new();

        let mut cumulative = 0usize;
        let mut i = 0;
        while i < sorted.len() {
            let value = sorted[i];
            while i < sorted.len() && sorted[i] == value {
                i += 1;
                cumulative += 1;
            }
            points.push(EcdfPoint {
                value: value.to_f64(),
                probability: cumulative as f64 / total,
            });
        }

        Some(Self { points })
    }

    /// Rebuild an ECDF from stored columns, checking its shape.
    pub fn from_columns(values: Vec<f64>, probabilities: Vec<f64>) -> Result<Self> {
        if values.len() != probabilities.len() {
            return Err(AnalysisError::LengthMismatch {
                baseline: values.len(),
                treatment: probabilities.len(),
            });
        }
        if values.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }

        let points = values
            .into_iter()
            .zip(probabilities)
            .map(|(value, probability)| EcdfPoint { value, probability })
            .collect();
        Ok(Self { points })
    }

    /// The real ECDF points, one per distinct value.
    pub fn points(&self) -> &[EcdfPoint] {
        &self.points
    }

    /// Points for step-function drawing: a synthetic `(first value, 0)`
    /// followed by the real points.
    pub fn step_points(&self) -> Vec<EcdfPoint> {
        let mut steps = Vec::with_capacity(self.points.len() + 1);
        if let Some(first) = self.points.first() {
            steps.push(EcdfPoint {
                value: first.value,
                probability: 0.0,
            });
        }
        steps.extend_from_slice(&self.points);
        steps
    }

    /// Fraction of samples `<= x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let idx = self.points.partition_point(|p| p.value <= x);
        if idx == 0 {
            0.0
        } else {
            self.points[idx - 1].probability
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.probability).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Mean, population standard deviation and ECDF of one sample series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub ecdf: Ecdf,
}

impl DistributionSummary {
    /// Summarise `samples`.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::EmptySeries`] when `samples` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cycle_stats::stats::DistributionSummary;
    ///
    /// let summary = DistributionSummary::from_samples(&[2u64, 4, 4, 4, 5, 5, 7, 9]).unwrap();
    /// assert_eq!(summary.mean, 5.0);
    /// assert_eq!(summary.std_dev, 2.0);
    /// ```
    pub fn from_samples<T: Sample>(samples: &[T]) -> Result<Self> {
        let (Some(mean), Some(std_dev), Some(ecdf)) = (
            mean(samples),
            population_std_dev(samples),
            Ecdf::from_samples(samples),
        ) else {
            return Err(AnalysisError::EmptySeries);
        };

        Ok(Self {
            count: samples.len(),
            mean,
            std_dev,
            ecdf,
        })
    }
}
