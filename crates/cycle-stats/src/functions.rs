//! Per-function paired comparison
//!
//! Two reshaped files, one per condition, list the same functions in the same
//! order. Each function becomes a [`FunctionRecord`] holding both series
//! before and after outlier filtering and the overhead of the `with`
//! condition over the `without` condition.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analysis::SeriesAnalysis;
use crate::compare::{ratio_of_means, TrendPair};
use crate::dataset::{SampleSeries, SequentialBuilder};
use crate::error::{AnalysisError, Result};
use crate::reshape::read_rows;

/// One function's paired measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Row position in both input files
    pub index: usize,
    pub name: String,
    /// Baseline condition
    pub without: SeriesAnalysis,
    /// Treatment condition
    pub with: SeriesAnalysis,
    pub raw_overhead: f64,
    pub filtered_overhead: f64,
}

impl FunctionRecord {
    pub fn new(index: usize, name: impl Into<String>, without: Vec<u64>, with: Vec<u64>) -> Result<Self> {
        let name = name.into();
        let without = SeriesAnalysis::from_series(
            SampleSeries::from(without),
            format_args!("{name} (row {index}, without)"),
        )?;
        let with = SeriesAnalysis::from_series(
            SampleSeries::from(with),
            format_args!("{name} (row {index}, with)"),
        )?;

        let raw_overhead = ratio_of_means(without.raw_summary.mean, with.raw_summary.mean)?;
        let filtered_overhead =
            ratio_of_means(without.filtered_summary.mean, with.filtered_summary.mean)?;

        Ok(Self {
            index,
            name,
            without,
            with,
            raw_overhead,
            filtered_overhead,
        })
    }
}

/// Every function of a paired run, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCollection {
    records: Vec<FunctionRecord>,
}

impl FunctionCollection {
    /// Read two reshaped files row by row.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::IdentifierMismatch`] when row `i` names different functions
    /// - [`AnalysisError::RowCountMismatch`] when one file ends first
    /// - anything [`FunctionRecord::new`] reports for a row
    #[instrument(skip_all, fields(without = %without.display(), with = %with.display()))]
    pub fn from_reshaped_files(without: &Path, with: &Path) -> Result<Self> {
        let open = |path: &Path| {
            File::open(path).map_err(|source| AnalysisError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let mut without_rows = read_rows(open(without)?, without);
        let mut with_rows = read_rows(open(with)?, with);

        let mut builder = SequentialBuilder::new();
        loop {
            let index = builder.next_index();
            let (without_row, with_row) = match (without_rows.next(), with_rows.next()) {
                (None, None) => break,
                (Some(Err(e)), _) | (_, Some(Err(e))) => return Err(e),
                (Some(Ok(a)), Some(Ok(b))) => (a, b),
                _ => {
                    return Err(AnalysisError::RowCountMismatch {
                        without: without.to_path_buf(),
                        with: with.to_path_buf(),
                        row: index + 1,
                    })
                }
            };

            if without_row.function != with_row.function {
                return Err(AnalysisError::IdentifierMismatch {
                    origin: format!("{} vs {}", without.display(), with.display()),
                    row: (index + 1) as u64,
                    expected: without_row.function,
                    found: with_row.function,
                });
            }

            let record = FunctionRecord::new(
                index,
                without_row.function,
                without_row.cycles,
                with_row.cycles,
            )?;
            builder.push_at(index, record)?;
        }

        let collection = Self {
            records: builder.finish(),
        };
        info!(functions = collection.len(), "function collection built");
        Ok(collection)
    }

    /// Rebuild a collection, checking that indices run `0..n`.
    pub fn from_records(records: Vec<FunctionRecord>) -> Result<Self> {
        let mut builder = SequentialBuilder::with_capacity(records.len());
        for record in records {
            builder.push_at(record.index, record)?;
        }
        Ok(Self {
            records: builder.finish(),
        })
    }

    pub fn records(&self) -> &[FunctionRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trend and overhead view over all functions, or those named `only`.
    pub fn report(&self, only: Option<&str>) -> Result<FunctionReport> {
        let selected: Vec<FunctionRecord> = self
            .records
            .iter()
            .filter(|record| only.map_or(true, |name| record.name == name))
            .cloned()
            .collect();
        debug!(selected = selected.len(), filter = ?only, "function report");

        let without_means: Vec<f64> = selected.iter().map(|r| r.without.raw_summary.mean).collect();
        let with_means: Vec<f64> = selected.iter().map(|r| r.with.raw_summary.mean).collect();
        let trend = TrendPair::from_means(&without_means, &with_means)?;

        let mut sorted_overheads: Vec<f64> = selected.iter().map(|r| r.raw_overhead).collect();
        sorted_overheads.sort_by(f64::total_cmp);
        let mut sorted_filtered_overheads: Vec<f64> =
            selected.iter().map(|r| r.filtered_overhead).collect();
        sorted_filtered_overheads.sort_by(f64::total_cmp);

        Ok(FunctionReport {
            filter: only.map(str::to_string),
            functions: selected,
            trend,
            sorted_overheads,
            sorted_filtered_overheads,
        })
    }
}

impl<'a> IntoIterator for &'a FunctionCollection {
    type Item = &'a FunctionRecord;
    type IntoIter = std::slice::Iter<'a, FunctionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Renderer input for the per-function comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionReport {
    /// Function name the report was restricted to
    pub filter: Option<String>,
    pub functions: Vec<FunctionRecord>,
    /// Raw means of both conditions, merged and sorted by pair average
    pub trend: TrendPair,
    /// Raw overheads, ascending
    pub sorted_overheads: Vec<f64>,
    /// Filtered overheads, ascending
    pub sorted_filtered_overheads: Vec<f64>,
}
