//! Directory-tree driven dataset assembly.
//!
//! ```text
//! <root>/<axis-0 value>/<axis-1 value>/.../<repetition-count>.csv
//! ```
//!
//! Each leaf file holds one line per trial with one comma-separated integer
//! per declared condition label, no header.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::{BenchmarkDataset, ConfigurationKey, RunRecord, SampleSeries};
use crate::config::{AxisConfig, Config};
use crate::error::{AnalysisError, Result};
use crate::input::LineRecords;

/// Walks the configured axis combinations and parses every leaf file.
#[derive(Debug, Clone)]
pub struct DatasetAssembler {
    name: String,
    root: PathBuf,
    axes: Vec<AxisConfig>,
    columns: Vec<String>,
}

impl DatasetAssembler {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        axes: Vec<AxisConfig>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            axes,
            columns,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.dataset.name.clone(),
            config.dataset.root.clone(),
            config.axes.clone(),
            config.dataset.columns.clone(),
        )
    }

    /// Every combination of axis values, first axis outermost.
    pub fn configuration_keys(&self) -> Vec<ConfigurationKey> {
        let mut prefixes: Vec<Vec<String>> = vec![Vec::new()];
        for axis in &self.axes {
            prefixes = prefixes
                .into_iter()
                .flat_map(|prefix| {
                    axis.values.iter().map(move |value| {
                        let mut key = prefix.clone();
                        key.push(value.clone());
                        key
                    })
                })
                .collect();
        }
        prefixes.into_iter().map(ConfigurationKey::new).collect()
    }

    /// Directory holding the files of one configuration.
    pub fn leaf_dir(&self, key: &ConfigurationKey) -> PathBuf {
        key.values()
            .iter()
            .fold(self.root.clone(), |dir, value| dir.join(value))
    }

    /// Read every declared configuration into a [`BenchmarkDataset`].
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MissingConfiguration`] for an absent or empty leaf directory
    /// - [`AnalysisError::InvalidFileName`] for a `.csv` file without a numeric stem
    /// - [`AnalysisError::DuplicateRepetition`] when two files share a repetition count
    /// - [`AnalysisError::MalformedLine`] for a line that is not N integers
    #[instrument(skip(self), fields(dataset = %self.name, root = %self.root.display()))]
    pub fn assemble(&self) -> Result<BenchmarkDataset> {
        let keys = self.configuration_keys();
        let mut records = Vec::with_capacity(keys.len());

        for key in keys {
            let leaf = self.leaf_dir(&key);
            let record = self.read_leaf(&leaf)?;
            debug!(configuration = %key, runs = record.len(), "configuration loaded");
            records.push((key, record));
        }

        info!(configurations = records.len(), "dataset assembled");
        Ok(BenchmarkDataset::from_records(
            self.name.clone(),
            self.axes.iter().map(|axis| axis.name.clone()).collect(),
            self.columns.clone(),
            records,
        ))
    }

    /// Every leaf file [`assemble`](Self::assemble) would read, in read order.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for key in self.configuration_keys() {
            files.extend(leaf_files(&self.leaf_dir(&key))?);
        }
        Ok(files)
    }

    fn read_leaf(&self, dir: &Path) -> Result<RunRecord> {
        let mut record = RunRecord::new();
        for path in leaf_files(dir)? {
            let repetitions = parse_repetition_count(&path)?;
            let conditions = self.read_sample_file(&path)?;
            if !record.insert(repetitions, conditions) {
                return Err(AnalysisError::DuplicateRepetition { path, repetitions });
            }
        }
        Ok(record)
    }

    fn read_sample_file(&self, path: &Path) -> Result<Vec<(String, SampleSeries)>> {
        let file = File::open(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let columns = parse_sample_columns(file, path, self.columns.len())?;
        debug!(file = %path.display(), trials = columns.first().map_or(0, Vec::len), "parsed samples");

        Ok(self
            .columns
            .iter()
            .cloned()
            .zip(columns.into_iter().map(SampleSeries::from))
            .collect())
    }
}

/// `.csv` files of one leaf directory, sorted by name.
fn leaf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AnalysisError::MissingConfiguration {
                path: dir.to_path_buf(),
                reason: "directory does not exist",
            })
        }
        Err(source) => {
            return Err(AnalysisError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AnalysisError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(AnalysisError::MissingConfiguration {
            path: dir.to_path_buf(),
            reason: "no <repetition-count>.csv files",
        });
    }

    Ok(files)
}

/// Repetition count encoded in a `<count>.csv` file name.
///
/// Underscores between digits are accepted as separators (`1_000_000.csv`).
pub fn parse_repetition_count(path: &Path) -> Result<u64> {
    let invalid = || AnalysisError::InvalidFileName {
        path: path.to_path_buf(),
    };

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    if stem.starts_with('_') || stem.ends_with('_') || stem.contains("__") {
        return Err(invalid());
    }
    stem.replace('_', "").parse::<u64>().map_err(|_| invalid())
}

/// Parse headerless lines of `columns` comma-separated integers into one
/// vector per column.
///
/// `path` is only used to locate errors.
pub fn parse_sample_columns<R: Read>(reader: R, path: &Path, columns: usize) -> Result<Vec<Vec<u64>>> {
    let mut parsed: Vec<Vec<u64>> = vec![Vec::new(); columns];

    for result in LineRecords::new(reader, path) {
        let (line, record) = result?;

        if record.len() != columns {
            return Err(AnalysisError::MalformedLine {
                path: path.to_path_buf(),
                line,
                message: format!(
                    "expected {} comma-separated integers, found {}",
                    columns,
                    record.len()
                ),
            });
        }

        for (column, field) in parsed.iter_mut().zip(record.iter()) {
            let value = field.parse::<u64>().map_err(|_| AnalysisError::MalformedLine {
                path: path.to_path_buf(),
                line,
                message: format!("'{}' is not a cycle count", field),
            })?;
            column.push(value);
        }
    }

    if parsed.first().map_or(true, Vec::is_empty) {
        return Err(AnalysisError::MalformedLine {
            path: path.to_path_buf(),
            line: 0,
            message: "file contains no samples".to_string(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("read_only/100000.csv")
    }

    #[test]
    fn test_parse_two_columns() {
        let input = "10,20\n11,21\n12,22\n";
        let columns = parse_sample_columns(input.as_bytes(), &path(), 2).unwrap();

        assert_eq!(columns, vec![vec![10, 11, 12], vec![20, 21, 22]]);
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_crlf() {
        let input = " 10 , 20 \r\n11,21\r\n";
        let columns = parse_sample_columns(input.as_bytes(), &path(), 2).unwrap();

        assert_eq!(columns, vec![vec![10, 11], vec![20, 21]]);
    }

    #[test]
    fn test_parse_wrong_column_count_reports_line() {
        let input = "10,20\n11,21,31\n";
        let err = parse_sample_columns(input.as_bytes(), &path(), 2).unwrap_err();

        match err {
            AnalysisError::MalformedLine { line, path: p, .. } => {
                assert_eq!(line, 2);
                assert_eq!(p, path());
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_non_integer() {
        let input = "10,20\n11,abc\n";
        let err = parse_sample_columns(input.as_bytes(), &path(), 2).unwrap_err();

        assert!(matches!(err, AnalysisError::MalformedLine { line: 2, .. }));
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_parse_negative_is_malformed() {
        let err = parse_sample_columns("-5,3\n".as_bytes(), &path(), 2).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn test_parse_empty_line_is_malformed() {
        let err = parse_sample_columns("10,20\n\n11,21\n\n".as_bytes(), &path(), 2).unwrap_err();

        match err {
            AnalysisError::MalformedLine { line, message, .. } => {
                assert_eq!(line, 2);
                assert_eq!(message, "empty line");
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_trailing_empty_line_is_malformed() {
        let err = parse_sample_columns("10,20\n11,21\n\n".as_bytes(), &path(), 2).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedLine { line: 3, .. }));
    }

    #[test]
    fn test_parse_without_final_newline() {
        let columns = parse_sample_columns("10,20\n11,21".as_bytes(), &path(), 2).unwrap();
        assert_eq!(columns, vec![vec![10, 11], vec![20, 21]]);
    }

    #[test]
    fn test_parse_empty_file() {
        let err = parse_sample_columns("".as_bytes(), &path(), 2).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedLine { line: 0, .. }));
    }

    #[test]
    fn test_repetition_count_from_file_name() {
        assert_eq!(parse_repetition_count(Path::new("a/b/100000.csv")).unwrap(), 100_000);
        assert_eq!(parse_repetition_count(Path::new("1_000_000.csv")).unwrap(), 1_000_000);
    }

    #[test]
    fn test_repetition_count_rejects_non_numeric() {
        for name in ["notes.csv", "_100.csv", "1__0.csv", "-3.csv"] {
            assert!(
                matches!(
                    parse_repetition_count(Path::new(name)),
                    Err(AnalysisError::InvalidFileName { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_configuration_keys_cartesian_product() {
        let assembler = DatasetAssembler::new(
            "mpk",
            "/data",
            vec![
                AxisConfig::new("mpk", ["with_mpk", "without_mpk"]),
                AxisConfig::new("access", ["read", "write", "read_write"]),
            ],
            vec!["inner_cycles".into(), "outer_cycles".into()],
        );

        let keys: Vec<String> = assembler
            .configuration_keys()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            keys,
            vec![
                "with_mpk/read",
                "with_mpk/write",
                "with_mpk/read_write",
                "without_mpk/read",
                "without_mpk/write",
                "without_mpk/read_write",
            ]
        );
        assert_eq!(
            assembler.leaf_dir(&ConfigurationKey::new(["with_mpk", "read"])),
            PathBuf::from("/data/with_mpk/read")
        );
    }
}
