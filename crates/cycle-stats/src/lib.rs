//! Cycle-count benchmark analysis
//!
//! This crate turns raw CPU cycle-count measurements into the statistics
//! needed to compare a baseline condition against a treatment condition
//! (for example unchecked vs. checked pointer accesses, or an allocator with
//! and without memory protection keys).
//!
//! # Features
//!
//! - **Dataset assembly**: Walk a `<axis>/<axis>/.../<repetitions>.csv` tree into a typed dataset
//! - **Trial reshaping**: Transpose trial-major per-function logs into function-major rows
//! - **Outlier filtering**: Median-centred 1.5 x IQR window with midpoint quartiles
//! - **Distribution statistics**: Mean, population standard deviation, ECDF
//! - **Paired comparison**: Overhead ratios and merge-and-sort trends
//! - **Snapshot cache**: Versioned JSON snapshots of computed analyses
//!
//! # Example
//!
//! ```no_run
//! use cycle_stats::{Analyzer, Config, DatasetAssembler, reporter::{OutputFormat, Reporter}};
//!
//! # fn example() -> anyhow::Result<()> {
//! // Load configuration
//! let config = Config::from_file("configs/mpk_malloc.toml")?;
//!
//! // Read the directory tree and analyse it
//! let dataset = DatasetAssembler::from_config(&config).assemble()?;
//! let report = Analyzer::from_config(&config).run(&dataset)?;
//!
//! // Report results
//! Reporter::new(OutputFormat::Console).report(&report)?;
//!
//! // Or save to file
//! Reporter::new(OutputFormat::Json).write_to_file(&report, "mpk_malloc.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Experiments are described using TOML files:
//!
//! ```toml
//! [dataset]
//! name = "MPK allocator"
//! root = "mpk_malloc"
//! columns = ["inner_cycles", "outer_cycles"]
//!
//! [[axes]]
//! name = "mpk"
//! values = ["with_mpk", "without_mpk"]
//!
//! [[axes]]
//! name = "access"
//! values = ["read", "write", "read_write"]
//!
//! [comparison]
//! kind = "axis"
//! axis = "mpk"
//! baseline = "without_mpk"
//! treatment = "with_mpk"
//! ```

pub mod analysis;
pub mod cache;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod error;
pub mod functions;
mod input;
pub mod reporter;
pub mod reshape;
pub mod stats;

// Re-export main types for convenience
pub use analysis::{AnalysisReport, Analyzer};
pub use config::Config;
pub use dataset::{BenchmarkDataset, ConfigurationKey, DatasetAssembler, SampleSeries};
pub use error::{AnalysisError, Result};
pub use functions::{FunctionCollection, FunctionReport};
pub use reporter::{OutputFormat, Reporter};
pub use reshape::TrialReshaper;
