//! Trial-major to function-major reshaping
//!
//! The per-function benchmark writes one `function,cycles` row per call, all
//! functions of trial 1 first, then all functions of trial 2 in the same
//! order, and so on. Analysis wants one row per function holding that
//! function's cycle count from every trial:
//!
//! ```text
//! f,10        f,10,11
//! g,20   ->   g,20,21
//! f,11
//! g,21
//! ```
//!
//! The transposition is purely positional, so every row of every later trial
//! is checked against the function seen at the same position in trial 1.

use std::fs::File;
use std::io::{Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{AnalysisError, Result};
use crate::input::LineRecords;

/// One output row: a function and its cycle count per trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapedRow {
    pub function: String,
    pub cycles: Vec<u64>,
}

/// Shape of a completed reshape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReshapeSummary {
    pub functions: usize,
    pub trials: usize,
}

/// Transposes a trial-major file of `trials * functions_per_trial` rows.
#[derive(Debug, Clone, Copy)]
pub struct TrialReshaper {
    functions_per_trial: NonZeroUsize,
    trials: Option<usize>,
}

impl TrialReshaper {
    /// Reshaper for trials of `functions_per_trial` rows each; the number of
    /// trials is inferred from the input.
    pub fn new(functions_per_trial: NonZeroUsize) -> Self {
        Self {
            functions_per_trial,
            trials: None,
        }
    }

    /// Require exactly `trials` trials.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }

    /// Start an incremental reshape; `origin` names the input in errors.
    pub fn accumulator(&self, origin: impl AsRef<Path>) -> TrialAccumulator {
        TrialAccumulator {
            functions_per_trial: self.functions_per_trial.get(),
            trials: self.trials,
            origin: origin.as_ref().to_path_buf(),
            rows: Vec::with_capacity(self.functions_per_trial.get()),
            position: 0,
        }
    }

    /// Reshape trial-major CSV from `reader`.
    pub fn reshape_reader<R: Read>(&self, reader: R, origin: &Path) -> Result<Vec<ReshapedRow>> {
        let mut accumulator = self.accumulator(origin);

        for result in LineRecords::new(reader, origin) {
            let (line, record) = result?;
            let malformed = |message: String| AnalysisError::MalformedLine {
                path: origin.to_path_buf(),
                line,
                message,
            };

            if record.len() != 2 {
                return Err(malformed(format!(
                    "expected function,cycles but found {} fields",
                    record.len()
                )));
            }
            let cycles = record[1]
                .parse::<u64>()
                .map_err(|_| malformed(format!("'{}' is not a cycle count", &record[1])))?;

            accumulator.push(line, &record[0], cycles)?;
        }

        accumulator.finish()
    }

    /// Reshape `input` into `output`, both CSV files.
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub fn reshape_file(&self, input: &Path, output: &Path) -> Result<ReshapeSummary> {
        let file = File::open(input).map_err(|source| AnalysisError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let rows = self.reshape_reader(file, input)?;
        let summary = ReshapeSummary {
            functions: rows.len(),
            trials: rows.first().map_or(0, |row| row.cycles.len()),
        };

        let out = File::create(output).map_err(|source| AnalysisError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        write_rows(&rows, out, output)?;

        info!(
            functions = summary.functions,
            trials = summary.trials,
            "reshaped trial-major file"
        );
        Ok(summary)
    }
}

/// Incremental state of one reshape.
#[derive(Debug)]
pub struct TrialAccumulator {
    functions_per_trial: usize,
    trials: Option<usize>,
    origin: PathBuf,
    rows: Vec<ReshapedRow>,
    position: usize,
}

impl TrialAccumulator {
    /// Feed the next input row, read from `line` of the input.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::IdentifierMismatch`] if `function` differs from the
    ///   trial-1 function at the same position
    /// - [`AnalysisError::MalformedLine`] if the row lies beyond the declared trials
    pub fn push(&mut self, line: u64, function: &str, cycles: u64) -> Result<()> {
        let trial = self.position / self.functions_per_trial;
        let slot = self.position % self.functions_per_trial;

        if let Some(trials) = self.trials {
            if trial >= trials {
                return Err(AnalysisError::MalformedLine {
                    path: self.origin.clone(),
                    line,
                    message: format!("row beyond the declared {} trials", trials),
                });
            }
        }

        if trial == 0 {
            let mut row_cycles = Vec::with_capacity(self.trials.unwrap_or(1));
            row_cycles.push(cycles);
            self.rows.push(ReshapedRow {
                function: function.to_string(),
                cycles: row_cycles,
            });
        } else {
            let row = &mut self.rows[slot];
            if row.function != function {
                return Err(AnalysisError::IdentifierMismatch {
                    origin: self.origin.display().to_string(),
                    row: line,
                    expected: row.function.clone(),
                    found: function.to_string(),
                });
            }
            row.cycles.push(cycles);
        }

        self.position += 1;
        if self.position % self.functions_per_trial == 0 {
            debug!(trial = trial + 1, "trial complete");
        }
        Ok(())
    }

    /// Rows consumed so far.
    pub fn rows_seen(&self) -> usize {
        self.position
    }

    /// Complete the reshape.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::TruncatedTrial`] if the input stopped mid-trial, was
    /// empty, or held fewer trials than declared.
    pub fn finish(self) -> Result<Vec<ReshapedRow>> {
        let complete = self.position > 0 && self.position % self.functions_per_trial == 0;
        let trials_seen = self.position / self.functions_per_trial;
        let count_matches = self.trials.map_or(true, |expected| expected == trials_seen);

        if !complete || !count_matches {
            return Err(AnalysisError::TruncatedTrial {
                path: self.origin,
                rows: self.position,
                functions_per_trial: self.functions_per_trial,
                expected_trials: self.trials,
            });
        }
        Ok(self.rows)
    }
}

/// Write function-major rows as headerless CSV.
pub fn write_rows<W: Write>(rows: &[ReshapedRow], writer: W, destination: &Path) -> Result<()> {
    let csv_error = |source: csv::Error| AnalysisError::Csv {
        path: destination.to_path_buf(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    for row in rows {
        let fields = std::iter::once(row.function.clone())
            .chain(row.cycles.iter().map(ToString::to_string));
        writer.write_record(fields).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|source| AnalysisError::Io {
            path: destination.to_path_buf(),
            source,
        })
}

/// Read function-major rows (`function,c1,c2,...`) from headerless CSV.
pub fn read_rows<R: Read>(reader: R, origin: &Path) -> impl Iterator<Item = Result<ReshapedRow>> {
    let records = LineRecords::new(reader, origin);
    let origin = origin.to_path_buf();
    records.map(move |result| {
        let (line, record) = result?;
        parse_reshaped_record(line, &record, &origin)
    })
}

fn parse_reshaped_record(line: u64, record: &csv::StringRecord, origin: &Path) -> Result<ReshapedRow> {
    let malformed = |message: String| AnalysisError::MalformedLine {
        path: origin.to_path_buf(),
        line,
        message,
    };

    let mut fields = record.iter();
    let function = fields
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| malformed("missing function identifier".to_string()))?;
    let cycles = fields
        .map(|field| {
            field
                .parse::<u64>()
                .map_err(|_| malformed(format!("'{}' is not a cycle count", field)))
        })
        .collect::<Result<Vec<u64>>>()?;

    if cycles.is_empty() {
        return Err(malformed(format!("function '{}' has no samples", function)));
    }

    Ok(ReshapedRow {
        function: function.to_string(),
        cycles,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: L functions x T trials -> L rows of T values, cell (i, j) = trial j of function i
        #[test]
        fn reshape_transposes(functions in 1usize..12, trials in 1usize..12, seed in any::<u64>()) {
            let value = |f: usize, t: usize| seed.wrapping_add((f * 1000 + t) as u64);
            let mut input = String::new();
            for t in 0..trials {
                for f in 0..functions {
                    input.push_str(&format!("fn{},{}\n", f, value(f, t)));
                }
            }

            let rows = TrialReshaper::new(NonZeroUsize::new(functions).unwrap())
                .reshape_reader(input.as_bytes(), Path::new("p.csv"))
                .unwrap();

            prop_assert_eq!(rows.len(), functions);
            for (f, row) in rows.iter().enumerate() {
                prop_assert_eq!(&row.function, &format!("fn{}", f));
                prop_assert_eq!(row.cycles.len(), trials);
                for (t, &cycles) in row.cycles.iter().enumerate() {
                    prop_assert_eq!(cycles, value(f, t));
                }
            }
        }
    }
}
