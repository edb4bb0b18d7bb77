//! Analysis orchestration
//!
//! Runs the pure statistics over an assembled [`BenchmarkDataset`] and
//! collects plain data for a renderer:
//!
//! - per configuration and label, the ordered `(repetition count, filtered
//!   series)` list with raw and filtered summaries
//! - per compared pair, the raw and filtered overhead at every repetition
//!   count and the merge-and-sort trend of the raw means
//!
//! Filtering is applied to each series on its own, so a filtered overhead may
//! compare means over different sample counts.
//!
//! # Example
//!
//! ```no_run
//! use cycle_stats::{analysis::Analyzer, config::Config, dataset::DatasetAssembler};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("configs/fakeptr.toml")?;
//! let dataset = DatasetAssembler::from_config(&config).assemble()?;
//! let report = Analyzer::from_config(&config).run(&dataset)?;
//!
//! for comparison in &report.comparisons {
//!     for entry in &comparison.overheads {
//!         println!("{} x{}: {:.3}", comparison.treatment, entry.repetitions, entry.filtered);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::compare::{ratio_of_means, TrendPair};
use crate::config::{ComparisonConfig, Config};
use crate::dataset::{BenchmarkDataset, ConfigurationKey, DatasetAssembler, SampleSeries};
use crate::error::{AnalysisError, Result};
use crate::stats::{DistributionSummary, QuartileSummary};

/// One sample series before and after outlier filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesAnalysis {
    pub raw: SampleSeries,
    pub raw_summary: DistributionSummary,
    pub filtered: SampleSeries,
    pub filtered_summary: DistributionSummary,
    /// Box-plot summary of the filtered series
    pub quartiles: QuartileSummary,
}

impl SeriesAnalysis {
    /// Filter `raw` and summarise both versions; `context` locates errors.
    pub fn from_series(raw: SampleSeries, context: impl fmt::Display) -> Result<Self> {
        let filtered = raw.without_outliers();
        if filtered.is_empty() && !raw.is_empty() {
            return Err(AnalysisError::EmptyFilteredSeries(context.to_string()));
        }

        let raw_summary = DistributionSummary::from_samples(raw.as_slice())?;
        let filtered_summary = DistributionSummary::from_samples(filtered.as_slice())?;
        let quartiles =
            QuartileSummary::from_samples(filtered.as_slice()).ok_or(AnalysisError::EmptySeries)?;

        Ok(Self {
            raw,
            raw_summary,
            filtered,
            filtered_summary,
            quartiles,
        })
    }

    pub fn outliers_removed(&self) -> usize {
        self.raw.len() - self.filtered.len()
    }
}

/// Analysis of one repetition count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionAnalysis {
    pub repetitions: u64,
    pub series: SeriesAnalysis,
}

/// All repetition counts of one condition label, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAnalysis {
    pub label: String,
    pub runs: Vec<RepetitionAnalysis>,
}

impl LabelAnalysis {
    /// `(repetition count, filtered series)` pairs, the distribution-plot input.
    pub fn filtered_collection(&self) -> Vec<(u64, &SampleSeries)> {
        self.runs
            .iter()
            .map(|run| (run.repetitions, &run.series.filtered))
            .collect()
    }

    /// Raw standard deviation per repetition count.
    pub fn raw_std_devs(&self) -> Vec<f64> {
        self.runs
            .iter()
            .map(|run| run.series.raw_summary.std_dev)
            .collect()
    }

    pub fn raw_means(&self) -> Vec<f64> {
        self.runs
            .iter()
            .map(|run| run.series.raw_summary.mean)
            .collect()
    }

    pub fn run(&self, repetitions: u64) -> Option<&RepetitionAnalysis> {
        self.runs.iter().find(|run| run.repetitions == repetitions)
    }
}

/// All labels of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationAnalysis {
    pub key: ConfigurationKey,
    pub labels: Vec<LabelAnalysis>,
}

impl ConfigurationAnalysis {
    pub fn label(&self, label: &str) -> Option<&LabelAnalysis> {
        self.labels.iter().find(|l| l.label == label)
    }
}

/// A condition: one label of one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRef {
    pub key: ConfigurationKey,
    pub label: String,
}

impl fmt::Display for ConditionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.label)
    }
}

/// Overhead ratios at one repetition count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverheadEntry {
    pub repetitions: u64,
    /// mean(treatment) / mean(baseline) over the raw series
    pub raw: f64,
    /// The same ratio over the independently filtered series
    pub filtered: f64,
}

/// One baseline/treatment comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonAnalysis {
    pub baseline: ConditionRef,
    pub treatment: ConditionRef,
    pub overheads: Vec<OverheadEntry>,
    /// Raw per-repetition means, merged and sorted by pair average
    pub trend: TrendPair,
}

/// Everything the renderer needs for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub axes: Vec<String>,
    pub labels: Vec<String>,
    pub configurations: Vec<ConfigurationAnalysis>,
    /// Pairing setting the comparisons were computed with
    pub comparison: Option<ComparisonConfig>,
    pub comparisons: Vec<ComparisonAnalysis>,
}

impl AnalysisReport {
    pub fn configuration(&self, key: &ConfigurationKey) -> Option<&ConfigurationAnalysis> {
        self.configurations.iter().find(|c| &c.key == key)
    }

    pub fn condition(&self, condition: &ConditionRef) -> Option<&LabelAnalysis> {
        self.configuration(&condition.key)?.label(&condition.label)
    }

    /// Whether this report was computed for the layout `config` describes.
    pub fn matches_config(&self, config: &Config) -> bool {
        let keys = DatasetAssembler::from_config(config).configuration_keys();

        self.name == config.dataset.name
            && self.axes.iter().map(String::as_str).eq(config.axis_names())
            && self.labels == config.dataset.columns
            && self.comparison == config.comparison
            && self.configurations.iter().map(|c| &c.key).eq(keys.iter())
    }
}

/// Runs filtering, summaries and comparisons over a dataset.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    comparison: Option<ComparisonConfig>,
}

impl Analyzer {
    pub fn new(comparison: Option<ComparisonConfig>) -> Self {
        Self { comparison }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.comparison.clone())
    }

    #[instrument(skip_all, fields(dataset = dataset.name()))]
    pub fn run(&self, dataset: &BenchmarkDataset) -> Result<AnalysisReport> {
        let mut configurations = Vec::with_capacity(dataset.len());

        for (key, record) in dataset.iter() {
            let mut labels = Vec::with_capacity(dataset.labels().len());
            for label in dataset.labels() {
                let mut runs = Vec::with_capacity(record.len());
                for (repetitions, series) in record.label_series(label) {
                    let context = format!("{key}:{label} x{repetitions}");
                    let series = SeriesAnalysis::from_series(series.clone(), &context)?;
                    debug!(
                        series = %context,
                        outliers = series.outliers_removed(),
                        "series analysed"
                    );
                    runs.push(RepetitionAnalysis {
                        repetitions,
                        series,
                    });
                }
                labels.push(LabelAnalysis {
                    label: label.clone(),
                    runs,
                });
            }
            configurations.push(ConfigurationAnalysis {
                key: key.clone(),
                labels,
            });
        }

        let mut report = AnalysisReport {
            name: dataset.name().to_string(),
            axes: dataset.axes().to_vec(),
            labels: dataset.labels().to_vec(),
            configurations,
            comparison: self.comparison.clone(),
            comparisons: Vec::new(),
        };

        for (baseline, treatment) in self.comparison_pairs(dataset)? {
            let comparison = compare_conditions(&report, baseline, treatment)?;
            report.comparisons.push(comparison);
        }

        info!(
            configurations = report.configurations.len(),
            comparisons = report.comparisons.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Baseline/treatment pairs named by the comparison setting.
    pub fn comparison_pairs(
        &self,
        dataset: &BenchmarkDataset,
    ) -> Result<Vec<(ConditionRef, ConditionRef)>> {
        let Some(comparison) = &self.comparison else {
            return Ok(Vec::new());
        };

        let mut pairs = Vec::new();
        match comparison {
            ComparisonConfig::Columns {
                baseline,
                treatment,
            } => {
                for (key, _) in dataset.iter() {
                    pairs.push((
                        ConditionRef {
                            key: key.clone(),
                            label: baseline.clone(),
                        },
                        ConditionRef {
                            key: key.clone(),
                            label: treatment.clone(),
                        },
                    ));
                }
            }
            ComparisonConfig::Axis {
                axis,
                baseline,
                treatment,
            } => {
                let index = dataset
                    .axis_index(axis)
                    .ok_or_else(|| AnalysisError::UnknownAxis(axis.clone()))?;

                for (key, _) in dataset.iter() {
                    if key.get(index) != Some(baseline.as_str()) {
                        continue;
                    }
                    let treatment_key = key.with_value(index, treatment);
                    if dataset.get(&treatment_key).is_none() {
                        return Err(AnalysisError::UnknownConfiguration(
                            treatment_key.to_string(),
                        ));
                    }
                    for label in dataset.labels() {
                        pairs.push((
                            ConditionRef {
                                key: key.clone(),
                                label: label.clone(),
                            },
                            ConditionRef {
                                key: treatment_key.clone(),
                                label: label.clone(),
                            },
                        ));
                    }
                }
            }
        }
        Ok(pairs)
    }
}

fn compare_conditions(
    report: &AnalysisReport,
    baseline: ConditionRef,
    treatment: ConditionRef,
) -> Result<ComparisonAnalysis> {
    let lookup = |condition: &ConditionRef| {
        report
            .condition(condition)
            .ok_or_else(|| AnalysisError::UnknownConfiguration(condition.to_string()))
    };
    let baseline_runs = lookup(&baseline)?;
    let treatment_runs = lookup(&treatment)?;

    let unpaired = |present: &ConditionRef, absent: &ConditionRef, repetitions| {
        AnalysisError::UnpairedRepetition {
            present: present.to_string(),
            absent: absent.to_string(),
            repetitions,
        }
    };
    if let Some(extra) = treatment_runs
        .runs
        .iter()
        .find(|run| baseline_runs.run(run.repetitions).is_none())
    {
        return Err(unpaired(&treatment, &baseline, extra.repetitions));
    }

    let mut overheads = Vec::with_capacity(baseline_runs.runs.len());
    for base in &baseline_runs.runs {
        let treated = treatment_runs
            .run(base.repetitions)
            .ok_or_else(|| unpaired(&baseline, &treatment, base.repetitions))?;

        overheads.push(OverheadEntry {
            repetitions: base.repetitions,
            raw: ratio_of_means(
                base.series.raw_summary.mean,
                treated.series.raw_summary.mean,
            )?,
            filtered: ratio_of_means(
                base.series.filtered_summary.mean,
                treated.series.filtered_summary.mean,
            )?,
        });
    }

    // Both sides hold the same repetition counts in the same ascending order
    let trend = TrendPair::from_means(&baseline_runs.raw_means(), &treatment_runs.raw_means())?;

    Ok(ComparisonAnalysis {
        baseline,
        treatment,
        overheads,
        trend,
    })
}
