//! Raw benchmark data model
//!
//! A [`BenchmarkDataset`] maps each [`ConfigurationKey`] (one value per
//! categorical axis, e.g. access pattern and mitigation state) to a
//! [`RunRecord`], which maps repetition counts to one [`SampleSeries`] per
//! condition label.

mod assembler;
mod builder;

pub use assembler::{parse_repetition_count, parse_sample_columns, DatasetAssembler};
pub use builder::SequentialBuilder;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::stats::remove_outliers;

/// Ordered tuple of axis values identifying one benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationKey(Vec<String>);

impl ConfigurationKey {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, axis: usize) -> Option<&str> {
        self.0.get(axis).map(String::as_str)
    }

    /// The same key with the value on `axis` replaced.
    pub fn with_value(&self, axis: usize, value: &str) -> Self {
        let mut values = self.0.clone();
        if let Some(slot) = values.get_mut(axis) {
            *slot = value.to_string();
        }
        Self(values)
    }
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Immutable sequence of cycle counts.
///
/// Cloning is cheap; filtering produces a new series and leaves this one intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct SampleSeries(Arc<[u64]>);

impl SampleSeries {
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    /// A new series with the median-centred IQR outliers removed.
    pub fn without_outliers(&self) -> SampleSeries {
        SampleSeries::from(remove_outliers(self.as_slice()))
    }
}

impl From<Vec<u64>> for SampleSeries {
    fn from(values: Vec<u64>) -> Self {
        Self(values.into())
    }
}

impl From<SampleSeries> for Vec<u64> {
    fn from(series: SampleSeries) -> Self {
        series.0.to_vec()
    }
}

impl AsRef<[u64]> for SampleSeries {
    fn as_ref(&self) -> &[u64] {
        &self.0
    }
}

/// Repetition count -> condition label -> samples, for one configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRecord {
    runs: BTreeMap<u64, BTreeMap<String, SampleSeries>>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the series for one repetition count.
    ///
    /// Returns `false` and leaves the record untouched if the repetition
    /// count is already present.
    pub fn insert(
        &mut self,
        repetitions: u64,
        conditions: impl IntoIterator<Item = (String, SampleSeries)>,
    ) -> bool {
        if self.runs.contains_key(&repetitions) {
            return false;
        }
        self.runs.insert(repetitions, conditions.into_iter().collect());
        true
    }

    pub fn contains(&self, repetitions: u64) -> bool {
        self.runs.contains_key(&repetitions)
    }

    /// Repetition counts in ascending order.
    pub fn repetitions(&self) -> impl Iterator<Item = u64> + '_ {
        self.runs.keys().copied()
    }

    pub fn series(&self, repetitions: u64, label: &str) -> Option<&SampleSeries> {
        self.runs.get(&repetitions)?.get(label)
    }

    /// `(repetition count, series)` for one label, ascending by repetition count.
    pub fn label_series<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = (u64, &'a SampleSeries)> + 'a {
        self.runs
            .iter()
            .filter_map(move |(&reps, conditions)| conditions.get(label).map(|s| (reps, s)))
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Fully assembled, read-only dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkDataset {
    name: String,
    axes: Vec<String>,
    labels: Vec<String>,
    order: Vec<ConfigurationKey>,
    records: BTreeMap<ConfigurationKey, RunRecord>,
}

impl BenchmarkDataset {
    /// Assemble a dataset from records given in declaration order.
    pub fn from_records(
        name: impl Into<String>,
        axes: Vec<String>,
        labels: Vec<String>,
        records: Vec<(ConfigurationKey, RunRecord)>,
    ) -> Self {
        let order = records.iter().map(|(key, _)| key.clone()).collect();
        Self {
            name: name.into(),
            axes,
            labels,
            order,
            records: records.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Axis names, outermost first.
    pub fn axes(&self) -> &[String] {
        &self.axes
    }

    pub fn axis_index(&self, axis: &str) -> Option<usize> {
        self.axes.iter().position(|name| name == axis)
    }

    /// Condition labels, in CSV column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, key: &ConfigurationKey) -> Option<&RunRecord> {
        self.records.get(key)
    }

    /// Configurations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigurationKey, &RunRecord)> {
        self.order
            .iter()
            .filter_map(|key| self.records.get(key).map(|record| (key, record)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
