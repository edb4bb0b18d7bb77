//! Versioned snapshot cache
//!
//! Analysing a large dataset is slow, so a computed [`AnalysisReport`] or
//! [`FunctionCollection`] can be written to a JSON snapshot and loaded back
//! in later runs. The file is an envelope around a flat record payload:
//!
//! ```text
//! {
//!   "format": "cycle-stats-cache",
//!   "version": 2,
//!   "created_at": "2026-10-19T12:00:00Z",
//!   "payload": { "kind": "dataset", "inputs": [...], "name": ..., "series": [...], ... }
//! }
//! ```
//!
//! Every payload lists the files it was computed from with their size and
//! modification time. Loading compares that list against the files the
//! caller is about to read and refuses a snapshot of other or changed inputs.
//!
//! The payload records are independent of the in-memory report types so
//! that either side can change without silently reinterpreting old files;
//! bump [`CACHE_VERSION`] when the record layout changes.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{
    AnalysisReport, ComparisonAnalysis, ConditionRef, ConfigurationAnalysis, LabelAnalysis,
    OverheadEntry, RepetitionAnalysis, SeriesAnalysis,
};
use crate::compare::TrendPair;
use crate::config::ComparisonConfig;
use crate::dataset::{ConfigurationKey, SampleSeries};
use crate::error::{AnalysisError, Result};
use crate::functions::{FunctionCollection, FunctionRecord};
use crate::stats::{DistributionSummary, Ecdf, QuartileSummary};

/// Format tag identifying snapshot files
pub const CACHE_FORMAT: &str = "cycle-stats-cache";

/// Layout version of the payload records
pub const CACHE_VERSION: u32 = 2;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    format: &'static str,
    version: u32,
    created_at: DateTime<Utc>,
    payload: &'a CachePayload,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    format: String,
    version: u32,
    created_at: DateTime<Utc>,
    payload: serde_json::Value,
}

/// What a snapshot holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachePayload {
    Dataset(DatasetSnapshot),
    Functions(FunctionSnapshot),
}

impl CachePayload {
    fn kind(&self) -> &'static str {
        match self {
            CachePayload::Dataset(_) => "dataset",
            CachePayload::Functions(_) => "functions",
        }
    }
}

/// Identity of one input file when a snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl InputStamp {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            len: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// Stamp each of `paths`, in order.
pub fn stamp_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<InputStamp>> {
    paths.iter().map(|path| InputStamp::of(path.as_ref())).collect()
}

/// Flattened [`AnalysisReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub inputs: Vec<InputStamp>,
    pub name: String,
    pub axes: Vec<String>,
    pub labels: Vec<String>,
    pub series: Vec<SeriesRecord>,
    pub comparison: Option<ComparisonConfig>,
    pub comparisons: Vec<ComparisonRecord>,
}

/// One series of one condition at one repetition count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub configuration: Vec<String>,
    pub label: String,
    pub repetitions: u64,
    pub values: SeriesValues,
}

/// Raw and filtered samples with their summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesValues {
    pub raw: Vec<u64>,
    pub filtered: Vec<u64>,
    pub raw_summary: SummaryRecord,
    pub filtered_summary: SummaryRecord,
    pub quartiles: QuartileSummary,
}

/// [`DistributionSummary`] with the ECDF stored as two columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub ecdf_values: Vec<f64>,
    pub ecdf_probabilities: Vec<f64>,
}

/// One baseline/treatment comparison as parallel columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub baseline_configuration: Vec<String>,
    pub baseline_label: String,
    pub treatment_configuration: Vec<String>,
    pub treatment_label: String,
    pub repetitions: Vec<u64>,
    pub raw_overheads: Vec<f64>,
    pub filtered_overheads: Vec<f64>,
    pub trend_baseline: Vec<f64>,
    pub trend_treatment: Vec<f64>,
}

/// Flattened [`FunctionCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSnapshot {
    pub inputs: Vec<InputStamp>,
    pub functions: Vec<FunctionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRow {
    pub index: usize,
    pub name: String,
    pub without: SeriesValues,
    pub with: SeriesValues,
    pub raw_overhead: f64,
    pub filtered_overhead: f64,
}

/// Write an analysis snapshot of `report`, computed from `inputs`.
pub fn save_report<P: AsRef<Path>>(path: &Path, report: &AnalysisReport, inputs: &[P]) -> Result<()> {
    let payload = CachePayload::Dataset(DatasetSnapshot::new(report, stamp_inputs(inputs)?));
    write_payload(path, &payload)?;
    info!(path = %path.display(), series = snapshot_len(&payload), "analysis cached");
    Ok(())
}

/// Load an analysis snapshot taken from exactly `inputs`.
///
/// # Errors
///
/// - [`AnalysisError::CacheFormat`] for a file that is not a snapshot, or
///   holds a function snapshot
/// - [`AnalysisError::StaleCache`] for a snapshot of another layout version
/// - [`AnalysisError::CacheMismatch`] when `inputs` are not the files the
///   snapshot was computed from, or have changed since
pub fn load_report<P: AsRef<Path>>(path: &Path, inputs: &[P]) -> Result<AnalysisReport> {
    match read_payload(path)? {
        CachePayload::Dataset(snapshot) => {
            check_inputs(path, &snapshot.inputs, inputs)?;
            snapshot.into_report(path)
        }
        other => Err(wrong_kind(path, "dataset", &other)),
    }
}

/// Write a per-function snapshot of `collection`, computed from `inputs`.
pub fn save_functions<P: AsRef<Path>>(
    path: &Path,
    collection: &FunctionCollection,
    inputs: &[P],
) -> Result<()> {
    let payload = CachePayload::Functions(FunctionSnapshot::new(collection, stamp_inputs(inputs)?));
    write_payload(path, &payload)?;
    info!(path = %path.display(), functions = snapshot_len(&payload), "functions cached");
    Ok(())
}

/// Load a per-function snapshot taken from exactly `inputs`.
pub fn load_functions<P: AsRef<Path>>(path: &Path, inputs: &[P]) -> Result<FunctionCollection> {
    match read_payload(path)? {
        CachePayload::Functions(snapshot) => {
            check_inputs(path, &snapshot.inputs, inputs)?;
            snapshot.into_collection(path)
        }
        other => Err(wrong_kind(path, "functions", &other)),
    }
}

fn snapshot_len(payload: &CachePayload) -> usize {
    match payload {
        CachePayload::Dataset(snapshot) => snapshot.series.len(),
        CachePayload::Functions(snapshot) => snapshot.functions.len(),
    }
}

fn check_inputs<P: AsRef<Path>>(path: &Path, recorded: &[InputStamp], inputs: &[P]) -> Result<()> {
    let current = stamp_inputs(inputs)?;
    if recorded == current.as_slice() {
        return Ok(());
    }

    let message = match recorded.iter().zip(&current).find(|(old, new)| old != new) {
        Some((old, new)) if old.path != new.path => format!(
            "snapshot was built from {}, not {}",
            old.path.display(),
            new.path.display()
        ),
        Some((_, new)) => format!("{} changed after the snapshot was taken", new.path.display()),
        None => format!(
            "snapshot was built from {} input files, now there are {}",
            recorded.len(),
            current.len()
        ),
    };
    Err(AnalysisError::CacheMismatch {
        path: path.to_path_buf(),
        message,
    })
}

fn wrong_kind(path: &Path, expected: &str, found: &CachePayload) -> AnalysisError {
    AnalysisError::CacheFormat {
        path: path.to_path_buf(),
        message: format!("expected a {} payload, found {}", expected, found.kind()),
    }
}

fn write_payload(path: &Path, payload: &CachePayload) -> Result<()> {
    let io_error = |source: std::io::Error| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    };
    let envelope = Envelope {
        format: CACHE_FORMAT,
        version: CACHE_VERSION,
        created_at: Utc::now(),
        payload,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush().map_err(io_error)
}

fn read_payload(path: &Path) -> Result<CachePayload> {
    let format_error = |message: String| AnalysisError::CacheFormat {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: RawEnvelope =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| format_error(e.to_string()))?;

    if envelope.format != CACHE_FORMAT {
        return Err(format_error(format!(
            "format tag is '{}', expected '{}'",
            envelope.format, CACHE_FORMAT
        )));
    }
    if envelope.version != CACHE_VERSION {
        return Err(AnalysisError::StaleCache {
            path: path.to_path_buf(),
            found: envelope.version,
            expected: CACHE_VERSION,
        });
    }

    debug!(path = %path.display(), created_at = %envelope.created_at, "cache envelope accepted");
    serde_json::from_value(envelope.payload).map_err(|e| format_error(e.to_string()))
}

impl From<&DistributionSummary> for SummaryRecord {
    fn from(summary: &DistributionSummary) -> Self {
        Self {
            count: summary.count,
            mean: summary.mean,
            std_dev: summary.std_dev,
            ecdf_values: summary.ecdf.values(),
            ecdf_probabilities: summary.ecdf.probabilities(),
        }
    }
}

impl SummaryRecord {
    fn into_summary(self) -> Result<DistributionSummary> {
        Ok(DistributionSummary {
            count: self.count,
            mean: self.mean,
            std_dev: self.std_dev,
            ecdf: Ecdf::from_columns(self.ecdf_values, self.ecdf_probabilities)?,
        })
    }
}

impl From<&SeriesAnalysis> for SeriesValues {
    fn from(series: &SeriesAnalysis) -> Self {
        Self {
            raw: series.raw.as_slice().to_vec(),
            filtered: series.filtered.as_slice().to_vec(),
            raw_summary: SummaryRecord::from(&series.raw_summary),
            filtered_summary: SummaryRecord::from(&series.filtered_summary),
            quartiles: series.quartiles,
        }
    }
}

impl SeriesValues {
    fn into_analysis(self, path: &Path) -> Result<SeriesAnalysis> {
        let invalid = |e: AnalysisError| AnalysisError::CacheFormat {
            path: path.to_path_buf(),
            message: format!("invalid summary: {e}"),
        };
        Ok(SeriesAnalysis {
            raw: SampleSeries::from(self.raw),
            filtered: SampleSeries::from(self.filtered),
            raw_summary: self.raw_summary.into_summary().map_err(invalid)?,
            filtered_summary: self.filtered_summary.into_summary().map_err(invalid)?,
            quartiles: self.quartiles,
        })
    }
}

impl DatasetSnapshot {
    pub fn new(report: &AnalysisReport, inputs: Vec<InputStamp>) -> Self {
        let mut series = Vec::new();
        for configuration in &report.configurations {
            for label in &configuration.labels {
                for run in &label.runs {
                    series.push(SeriesRecord {
                        configuration: configuration.key.values().to_vec(),
                        label: label.label.clone(),
                        repetitions: run.repetitions,
                        values: SeriesValues::from(&run.series),
                    });
                }
            }
        }

        let comparisons = report
            .comparisons
            .iter()
            .map(|comparison| ComparisonRecord {
                baseline_configuration: comparison.baseline.key.values().to_vec(),
                baseline_label: comparison.baseline.label.clone(),
                treatment_configuration: comparison.treatment.key.values().to_vec(),
                treatment_label: comparison.treatment.label.clone(),
                repetitions: comparison.overheads.iter().map(|e| e.repetitions).collect(),
                raw_overheads: comparison.overheads.iter().map(|e| e.raw).collect(),
                filtered_overheads: comparison.overheads.iter().map(|e| e.filtered).collect(),
                trend_baseline: comparison.trend.baseline.clone(),
                trend_treatment: comparison.trend.treatment.clone(),
            })
            .collect();

        Self {
            inputs,
            name: report.name.clone(),
            axes: report.axes.clone(),
            labels: report.labels.clone(),
            series,
            comparison: report.comparison.clone(),
            comparisons,
        }
    }

    /// Regroup the flat records; `path` locates errors.
    pub fn into_report(self, path: &Path) -> Result<AnalysisReport> {
        let mut configurations: Vec<ConfigurationAnalysis> = Vec::new();

        for record in self.series {
            let key = ConfigurationKey::new(record.configuration);
            let position = match configurations.iter().position(|c| c.key == key) {
                Some(position) => position,
                None => {
                    configurations.push(ConfigurationAnalysis {
                        key,
                        labels: Vec::new(),
                    });
                    configurations.len() - 1
                }
            };
            let labels = &mut configurations[position].labels;

            let position = match labels.iter().position(|l| l.label == record.label) {
                Some(position) => position,
                None => {
                    labels.push(LabelAnalysis {
                        label: record.label,
                        runs: Vec::new(),
                    });
                    labels.len() - 1
                }
            };
            labels[position].runs.push(RepetitionAnalysis {
                repetitions: record.repetitions,
                series: record.values.into_analysis(path)?,
            });
        }

        let comparisons = self
            .comparisons
            .into_iter()
            .map(|record| record.into_comparison(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(AnalysisReport {
            name: self.name,
            axes: self.axes,
            labels: self.labels,
            configurations,
            comparison: self.comparison,
            comparisons,
        })
    }
}

impl ComparisonRecord {
    fn into_comparison(self, path: &Path) -> Result<ComparisonAnalysis> {
        let n = self.repetitions.len();
        if self.raw_overheads.len() != n
            || self.filtered_overheads.len() != n
            || self.trend_baseline.len() != self.trend_treatment.len()
        {
            return Err(AnalysisError::CacheFormat {
                path: path.to_path_buf(),
                message: format!(
                    "comparison {}:{} -> {}:{} has columns of different lengths",
                    self.baseline_configuration.join("/"),
                    self.baseline_label,
                    self.treatment_configuration.join("/"),
                    self.treatment_label
                ),
            });
        }

        let overheads = self
            .repetitions
            .iter()
            .zip(&self.raw_overheads)
            .zip(&self.filtered_overheads)
            .map(|((&repetitions, &raw), &filtered)| OverheadEntry {
                repetitions,
                raw,
                filtered,
            })
            .collect();

        Ok(ComparisonAnalysis {
            baseline: ConditionRef {
                key: ConfigurationKey::new(self.baseline_configuration),
                label: self.baseline_label,
            },
            treatment: ConditionRef {
                key: ConfigurationKey::new(self.treatment_configuration),
                label: self.treatment_label,
            },
            overheads,
            trend: TrendPair {
                baseline: self.trend_baseline,
                treatment: self.trend_treatment,
            },
        })
    }
}

impl FunctionSnapshot {
    pub fn new(collection: &FunctionCollection, inputs: Vec<InputStamp>) -> Self {
        Self {
            inputs,
            functions: collection
                .iter()
                .map(|record| FunctionRow {
                    index: record.index,
                    name: record.name.clone(),
                    without: SeriesValues::from(&record.without),
                    with: SeriesValues::from(&record.with),
                    raw_overhead: record.raw_overhead,
                    filtered_overhead: record.filtered_overhead,
                })
                .collect(),
        }
    }

    pub fn into_collection(self, path: &Path) -> Result<FunctionCollection> {
        let records = self
            .functions
            .into_iter()
            .map(|row| {
                Ok(FunctionRecord {
                    index: row.index,
                    name: row.name,
                    without: row.without.into_analysis(path)?,
                    with: row.with.into_analysis(path)?,
                    raw_overhead: row.raw_overhead,
                    filtered_overhead: row.filtered_overhead,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        FunctionCollection::from_records(records)
    }
}
