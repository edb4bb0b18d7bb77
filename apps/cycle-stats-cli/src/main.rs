//! cycle-stats binary
//!
//! Entry point exposing the analysis pipeline as subcommands.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cycle_stats::{
    cache, AnalysisError, AnalysisReport, Analyzer, Config, DatasetAssembler, FunctionCollection,
    OutputFormat, Reporter, TrialReshaper,
};

#[derive(Parser, Debug)]
#[command(name = "cycle-stats")]
#[command(version, about = "Outlier-filtered statistics and overheads for cycle-count benchmarks")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transpose a trial-major function,cycles log into one row per function
    Reshape {
        /// Trial-major input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Function-major output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Rows per trial
        #[arg(short = 'l', long)]
        functions_per_trial: NonZeroUsize,

        /// Expected number of trials (inferred when omitted)
        #[arg(short, long)]
        trials: Option<usize>,
    },

    /// Assemble and analyse a directory-tree dataset
    Analyze {
        /// Experiment configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output format: console, json or json-pretty
        #[arg(short, long, default_value = "console")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore and overwrite the configured cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Compare two reshaped per-function files
    Functions {
        /// Reshaped file of the baseline condition
        #[arg(long)]
        without: PathBuf,

        /// Reshaped file of the treatment condition
        #[arg(long)]
        with: PathBuf,

        /// Restrict the report to one function name
        #[arg(long)]
        only: Option<String>,

        /// Snapshot of the function collection, reused when valid
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Output format: console, json or json-pretty
        #[arg(short, long, default_value = "console")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Reports go to stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Reshape {
            input,
            output,
            functions_per_trial,
            trials,
        } => {
            let mut reshaper = TrialReshaper::new(functions_per_trial);
            if let Some(trials) = trials {
                reshaper = reshaper.with_trials(trials);
            }
            let summary = reshaper
                .reshape_file(&input, &output)
                .with_context(|| format!("Failed to reshape {}", input.display()))?;
            eprintln!(
                "{} functions x {} trials written to {}",
                summary.functions,
                summary.trials,
                output.display()
            );
        }
        Command::Analyze {
            config,
            format,
            output,
            no_cache,
        } => {
            let config = Config::from_file(&config)?;
            let report = analyze(&config, no_cache)?;
            emit(&Reporter::new(format), &report, output.as_deref())?;
        }
        Command::Functions {
            without,
            with,
            only,
            cache,
            format,
            output,
        } => {
            let collection = load_functions(&without, &with, cache.as_deref())?;
            let report = collection.report(only.as_deref())?;
            emit(&Reporter::new(format), &report, output.as_deref())?;
        }
    }

    Ok(())
}

fn analyze(config: &Config, no_cache: bool) -> Result<AnalysisReport> {
    let assembler = DatasetAssembler::from_config(config);
    let inputs = assembler.source_files()?;

    if let Some(path) = config.cache_path().filter(|path| !no_cache && path.exists()) {
        match cache::load_report(path, &inputs) {
            Ok(report) if report.matches_config(config) => {
                info!(cache = %path.display(), "using cached analysis");
                return Ok(report);
            }
            Ok(_) => warn!(cache = %path.display(), "cached analysis is for another layout, recomputing"),
            Err(e) if is_unusable_cache(&e) => {
                warn!(cache = %path.display(), error = %e, "ignoring unusable cache")
            }
            Err(e) => return Err(e.into()),
        }
    }

    let dataset = assembler.assemble()?;
    let report = Analyzer::from_config(config).run(&dataset)?;

    if let Some(path) = config.cache_path() {
        cache::save_report(path, &report, &inputs)
            .with_context(|| format!("Failed to write cache {}", path.display()))?;
    }
    Ok(report)
}

fn load_functions(without: &Path, with: &Path, cache_path: Option<&Path>) -> Result<FunctionCollection> {
    let inputs = [without, with];

    if let Some(path) = cache_path.filter(|path| path.exists()) {
        match cache::load_functions(path, &inputs) {
            Ok(collection) => {
                info!(cache = %path.display(), functions = collection.len(), "using cached functions");
                return Ok(collection);
            }
            Err(e) if is_unusable_cache(&e) => {
                warn!(cache = %path.display(), error = %e, "ignoring unusable cache")
            }
            Err(e) => return Err(e.into()),
        }
    }

    let collection = FunctionCollection::from_reshaped_files(without, with)?;
    if let Some(path) = cache_path {
        cache::save_functions(path, &collection, &inputs)
            .with_context(|| format!("Failed to write cache {}", path.display()))?;
    }
    Ok(collection)
}

/// A snapshot that is recomputed rather than reported as an error.
fn is_unusable_cache(error: &AnalysisError) -> bool {
    matches!(
        error,
        AnalysisError::StaleCache { .. }
            | AnalysisError::CacheFormat { .. }
            | AnalysisError::CacheMismatch { .. }
    )
}

fn emit<R: cycle_stats::reporter::Report>(
    reporter: &Reporter,
    report: &R,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            reporter
                .write_to_file(report, path)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!(output = %path.display(), format = %reporter.output_format(), "report written");
        }
        None => reporter.report(report)?,
    }
    Ok(())
}
