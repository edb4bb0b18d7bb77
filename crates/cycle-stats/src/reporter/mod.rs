//! Analysis result reporting
//!
//! Formats an [`AnalysisReport`] or a [`FunctionReport`] in one of several
//! output formats.
//!
//! # Output Formats
//!
//! - **JSON**: Machine-readable format for plotting scripts
//! - **Console**: Human-readable tables, one per configuration
//!
//! # Example
//!
//! ```no_run
//! use cycle_stats::analysis::AnalysisReport;
//! use cycle_stats::reporter::{OutputFormat, Reporter};
//!
//! # fn example(report: AnalysisReport) -> anyhow::Result<()> {
//! let reporter = Reporter::new(OutputFormat::Console);
//! reporter.report(&report)?;
//!
//! // Or write to a file
//! Reporter::new(OutputFormat::Json).write_to_file(&report, "report.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::analysis::AnalysisReport;
use crate::functions::FunctionReport;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON format for machine parsing
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Plain-text tables
    #[default]
    Console,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "console" | "text" => Ok(OutputFormat::Console),
            other => Err(format!(
                "unknown output format '{other}' (expected console, json or json-pretty)"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
            OutputFormat::Console => "console",
        };
        f.write_str(name)
    }
}

/// A report the [`Reporter`] knows how to render.
pub trait Report: Serialize {
    fn to_console(&self) -> Result<String>;
}

impl Report for AnalysisReport {
    fn to_console(&self) -> Result<String> {
        ConsoleReporter::format_analysis(self)
    }
}

impl Report for FunctionReport {
    fn to_console(&self) -> Result<String> {
        ConsoleReporter::format_functions(self)
    }
}

/// Reporter for analysis results
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a new reporter with the specified output format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Report to stdout
    pub fn report<R: Report>(&self, report: &R) -> Result<()> {
        let output = self.format_report(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Write a report to a file
    pub fn write_to_file<R: Report, P: AsRef<Path>>(&self, report: &R, path: P) -> Result<()> {
        let output = self.format_report(report)?;
        fs::write(path, output)?;
        Ok(())
    }

    /// Format a report as a string
    pub fn format_report<R: Report>(&self, report: &R) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
            OutputFormat::Console => report.to_console(),
        }
    }
}
