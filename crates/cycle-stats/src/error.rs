use std::path::PathBuf;

use thiserror::Error;

/// Every failure is fatal to the current analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read CSV from {}: {}", .path.display(), .source)]
    Csv { path: PathBuf, source: csv::Error },

    #[error("missing configuration {}: {}", .path.display(), .reason)]
    MissingConfiguration { path: PathBuf, reason: &'static str },

    #[error("unknown configuration {0}")]
    UnknownConfiguration(String),

    #[error("axis '{0}' is not declared for this dataset")]
    UnknownAxis(String),

    #[error("file name {} is not <repetition-count>.csv", .path.display())]
    InvalidFileName { path: PathBuf },

    #[error("repetition count {repetitions} appears twice in {}", .path.display())]
    DuplicateRepetition { path: PathBuf, repetitions: u64 },

    #[error("{}:{}: {}", .path.display(), .line, .message)]
    MalformedLine {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("{origin}: row {row} has function '{found}' but '{expected}' was expected at that position")]
    IdentifierMismatch {
        origin: String,
        row: u64,
        expected: String,
        found: String,
    },

    #[error("{} and {} diverge in length at row {}", .without.display(), .with.display(), .row)]
    RowCountMismatch {
        without: PathBuf,
        with: PathBuf,
        row: usize,
    },

    #[error("{}: {rows} rows do not form complete trials of {functions_per_trial} functions (declared trials: {expected_trials:?})", .path.display())]
    TruncatedTrial {
        path: PathBuf,
        rows: usize,
        functions_per_trial: usize,
        expected_trials: Option<usize>,
    },

    #[error("out-of-order insertion: expected index {expected}, got {got}")]
    OutOfOrderIndex { expected: usize, got: usize },

    #[error("overhead ratio is undefined against a zero-mean baseline")]
    DegenerateRatio,

    #[error("statistic requested over an empty sample series")]
    EmptySeries,

    #[error("outlier filtering left no samples in {0}")]
    EmptyFilteredSeries(String),

    #[error("paired sequences differ in length: {baseline} baseline vs {treatment} treatment")]
    LengthMismatch { baseline: usize, treatment: usize },

    #[error("repetition count {repetitions} is present for {present} but not for {absent}")]
    UnpairedRepetition {
        present: String,
        absent: String,
        repetitions: u64,
    },

    #[error("cache {} has version {found}, expected {expected}", .path.display())]
    StaleCache {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("cache {} is unreadable: {}", .path.display(), .message)]
    CacheFormat { path: PathBuf, message: String },

    #[error("cache {} does not belong to the current inputs: {}", .path.display(), .message)]
    CacheMismatch { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
