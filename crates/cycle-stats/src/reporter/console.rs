//! Console reporter for analysis results
//!
//! Provides human-readable output with ASCII tables.

use anyhow::Result;
use std::fmt::Write;

use crate::analysis::{AnalysisReport, ComparisonAnalysis, ConfigurationAnalysis};
use crate::functions::{FunctionRecord, FunctionReport};
use crate::stats::percentile;

/// Functions listed individually in a function report, highest overhead first
const MAX_FUNCTION_ROWS: usize = 25;

const RULE: &str = "────────────────────────────────────────────────────────────────────────────";

/// Console format reporter
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Format a dataset analysis for console output
    pub fn format_analysis(report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        Self::format_banner(&mut output, "CYCLE COUNT ANALYSIS")?;
        writeln!(output, "Dataset:   {}", report.name)?;
        writeln!(output, "Axes:      {}", report.axes.join(" / "))?;
        writeln!(output, "Labels:    {}", report.labels.join(", "))?;
        writeln!(output)?;

        for configuration in &report.configurations {
            Self::format_configuration(&mut output, configuration)?;
        }

        if !report.comparisons.is_empty() {
            writeln!(output, "{RULE}")?;
            writeln!(output, "Overheads (treatment mean / baseline mean)")?;
            writeln!(output, "{RULE}")?;
            writeln!(output)?;
            for comparison in &report.comparisons {
                Self::format_comparison(&mut output, comparison)?;
            }
        }

        Ok(output)
    }

    /// Format a per-function comparison for console output
    pub fn format_functions(report: &FunctionReport) -> Result<String> {
        let mut output = String::new();

        Self::format_banner(&mut output, "PER-FUNCTION OVERHEAD")?;
        writeln!(
            output,
            "Functions: {}{}",
            report.functions.len(),
            report
                .filter
                .as_ref()
                .map(|name| format!(" (only {name})"))
                .unwrap_or_default()
        )?;
        if report.functions.is_empty() {
            writeln!(output)?;
            return Ok(output);
        }

        let overhead_stat = |values: &[f64], p: f64| percentile(values, p).unwrap_or(f64::NAN);
        writeln!(output)?;
        writeln!(output, "  Overhead     Min       P25       P50       P75       Max")?;
        for (name, values) in [
            ("raw", &report.sorted_overheads),
            ("filtered", &report.sorted_filtered_overheads),
        ] {
            writeln!(
                output,
                "  {:<9} {:>8.3}  {:>8.3}  {:>8.3}  {:>8.3}  {:>8.3}",
                name,
                overhead_stat(values, 0.0),
                overhead_stat(values, 25.0),
                overhead_stat(values, 50.0),
                overhead_stat(values, 75.0),
                overhead_stat(values, 100.0)
            )?;
        }
        writeln!(output)?;

        let mut ranked: Vec<&FunctionRecord> = report.functions.iter().collect();
        ranked.sort_by(|a, b| b.raw_overhead.total_cmp(&a.raw_overhead));

        writeln!(output, "{RULE}")?;
        writeln!(
            output,
            "  {:>6}  {:<32} {:>9} {:>9} {:>8}",
            "Row", "Function", "Raw", "Filtered", "Outliers"
        )?;
        writeln!(output, "{RULE}")?;
        for record in ranked.iter().take(MAX_FUNCTION_ROWS) {
            writeln!(
                output,
                "  {:>6}  {:<32} {:>9.3} {:>9.3} {:>4}/{:<3}",
                record.index,
                truncate(&record.name, 32),
                record.raw_overhead,
                record.filtered_overhead,
                record.without.outliers_removed(),
                record.with.outliers_removed()
            )?;
        }
        if ranked.len() > MAX_FUNCTION_ROWS {
            writeln!(output, "  ... {} more", ranked.len() - MAX_FUNCTION_ROWS)?;
        }
        writeln!(output)?;

        Ok(output)
    }

    fn format_banner(output: &mut String, title: &str) -> Result<()> {
        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║ {:^60} ║", title)?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;
        Ok(())
    }

    fn format_configuration(output: &mut String, configuration: &ConfigurationAnalysis) -> Result<()> {
        writeln!(output, "{RULE}")?;
        writeln!(output, "Configuration: {}", configuration.key)?;
        writeln!(output, "{RULE}")?;
        writeln!(
            output,
            "  {:<14} {:>12} {:>6} {:>5} {:>12} {:>10} {:>12} {:>10}",
            "Label", "Repetitions", "n", "out", "Mean", "StdDev", "Filt. mean", "Filt. std"
        )?;

        for label in &configuration.labels {
            for run in &label.runs {
                let series = &run.series;
                writeln!(
                    output,
                    "  {:<14} {:>12} {:>6} {:>5} {:>12.1} {:>10.1} {:>12.1} {:>10.1}",
                    truncate(&label.label, 14),
                    run.repetitions,
                    series.raw_summary.count,
                    series.outliers_removed(),
                    series.raw_summary.mean,
                    series.raw_summary.std_dev,
                    series.filtered_summary.mean,
                    series.filtered_summary.std_dev
                )?;
            }
        }
        writeln!(output)?;
        Ok(())
    }

    fn format_comparison(output: &mut String, comparison: &ComparisonAnalysis) -> Result<()> {
        writeln!(output, "  {} -> {}", comparison.baseline, comparison.treatment)?;
        writeln!(output, "  {:>12} {:>10} {:>10}", "Repetitions", "Raw", "Filtered")?;
        for entry in &comparison.overheads {
            writeln!(
                output,
                "  {:>12} {:>10.4} {:>10.4}",
                entry.repetitions, entry.raw, entry.filtered
            )?;
        }
        writeln!(output)?;
        Ok(())
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
