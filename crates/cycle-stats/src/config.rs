//! Configuration parsing for experiment layouts
//!
//! This module provides TOML-based configuration describing where an
//! experiment's raw cycle counts live, which directory axes encode its
//! configurations, and which conditions are compared against each other.

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dataset location and column layout
    pub dataset: DatasetConfig,
    /// Categorical axes, outermost directory level first
    pub axes: Vec<AxisConfig>,
    /// Paired conditions to compare
    #[serde(default)]
    pub comparison: Option<ComparisonConfig>,
    /// Snapshot cache of the computed analysis
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Relative `dataset.root` and `cache.path` values are resolved against
    /// the directory containing the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - Required fields are missing
    /// - The layout fails [`Config::validate`]
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cycle_stats::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("configs/fakeptr.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use cycle_stats::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [dataset]
    ///     name = "Pseudo-pointers"
    ///     root = "fakeptr"
    ///     columns = ["unsafe", "safe"]
    ///
    ///     [[axes]]
    ///     name = "access"
    ///     values = ["read_only", "write_only"]
    /// "#;
    /// let config = Config::from_str(toml)?;
    /// assert_eq!(config.axis_names(), vec!["access"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check the layout for inconsistencies that would only surface mid-run.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.axes.is_empty(), "at least one [[axes]] entry is required");
        ensure!(
            !self.dataset.columns.is_empty(),
            "dataset.columns must name at least one condition"
        );
        ensure_unique("dataset.columns", &self.dataset.columns)?;

        let mut axis_names = HashSet::new();
        for axis in &self.axes {
            ensure!(
                axis_names.insert(axis.name.as_str()),
                "axis '{}' is declared twice",
                axis.name
            );
            ensure!(!axis.values.is_empty(), "axis '{}' has no values", axis.name);
            ensure_unique(&format!("axis '{}'", axis.name), &axis.values)?;
        }

        match &self.comparison {
            None => {}
            Some(ComparisonConfig::Columns {
                baseline,
                treatment,
            }) => {
                for label in [baseline, treatment] {
                    ensure!(
                        self.dataset.columns.contains(label),
                        "comparison column '{}' is not in dataset.columns",
                        label
                    );
                }
                ensure!(baseline != treatment, "comparison compares '{}' with itself", baseline);
            }
            Some(ComparisonConfig::Axis {
                axis,
                baseline,
                treatment,
            }) => {
                let Some(declared) = self.axes.iter().find(|a| &a.name == axis) else {
                    bail!("comparison axis '{}' is not declared", axis);
                };
                for value in [baseline, treatment] {
                    ensure!(
                        declared.values.contains(value),
                        "comparison value '{}' is not a value of axis '{}'",
                        value,
                        axis
                    );
                }
                ensure!(baseline != treatment, "comparison compares '{}' with itself", baseline);
            }
        }

        Ok(())
    }

    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.iter().map(|axis| axis.name.as_str()).collect()
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache.as_ref().map(|cache| cache.path.as_path())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if self.dataset.root.is_relative() {
            self.dataset.root = base.join(&self.dataset.root);
        }
        if let Some(cache) = &mut self.cache {
            if cache.path.is_relative() {
                cache.path = base.join(&cache.path);
            }
        }
    }
}

fn ensure_unique(what: &str, values: &[String]) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        ensure!(seen.insert(value), "{} lists '{}' twice", what, value);
    }
    Ok(())
}

/// Where the raw data lives and how each leaf file is laid out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Name of the experiment
    pub name: String,
    /// Root of the directory tree
    pub root: PathBuf,
    /// Condition label of each CSV column, in order
    pub columns: Vec<String>,
}

/// One categorical axis encoded as a directory level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub name: String,
    pub values: Vec<String>,
}

impl AxisConfig {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which two conditions form a baseline/treatment pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonConfig {
    /// Two CSV columns of the same leaf file
    Columns { baseline: String, treatment: String },
    /// Two values of one directory axis, compared label by label
    Axis {
        axis: String,
        baseline: String,
        treatment: String,
    },
}

/// Location of the analysis snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [dataset]
        name = "Pseudo-pointers"
        root = "fakeptr"
        columns = ["unsafe", "safe"]

        [[axes]]
        name = "access"
        values = ["read_write", "read_only", "write_only"]
    "#;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_str(MINIMAL).unwrap();

        assert_eq!(config.dataset.name, "Pseudo-pointers");
        assert_eq!(config.dataset.root, PathBuf::from("fakeptr"));
        assert_eq!(config.dataset.columns, vec!["unsafe", "safe"]);
        assert_eq!(config.axes.len(), 1);
        assert!(config.comparison.is_none());
        assert!(config.cache_path().is_none());
    }

    #[test]
    fn test_parse_axis_comparison() {
        let toml = r#"
            [dataset]
            name = "MPK allocator"
            root = "mpk_malloc"
            columns = ["inner_cycles", "outer_cycles"]

            [[axes]]
            name = "mpk"
            values = ["with_mpk", "without_mpk"]

            [[axes]]
            name = "access"
            values = ["read", "write", "read_write"]

            [comparison]
            kind = "axis"
            axis = "mpk"
            baseline = "without_mpk"
            treatment = "with_mpk"

            [cache]
            path = "mpk.cache.json"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.axis_names(), vec!["mpk", "access"]);
        assert_eq!(
            config.comparison,
            Some(ComparisonConfig::Axis {
                axis: "mpk".into(),
                baseline: "without_mpk".into(),
                treatment: "with_mpk".into(),
            })
        );
        assert_eq!(config.cache_path(), Some(Path::new("mpk.cache.json")));
    }

    #[test]
    fn test_parse_column_comparison() {
        let toml = format!(
            "{MINIMAL}\n[comparison]\nkind = \"columns\"\nbaseline = \"unsafe\"\ntreatment = \"safe\"\n"
        );
        let config = Config::from_str(&toml).unwrap();
        assert_eq!(
            config.comparison,
            Some(ComparisonConfig::Columns {
                baseline: "unsafe".into(),
                treatment: "safe".into(),
            })
        );
    }

    #[test]
    fn test_rejects_unknown_comparison_column() {
        let toml = format!(
            "{MINIMAL}\n[comparison]\nkind = \"columns\"\nbaseline = \"unsafe\"\ntreatment = \"fast\"\n"
        );
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("'fast'"));
    }

    #[test]
    fn test_rejects_unknown_comparison_axis() {
        let toml = format!(
            "{MINIMAL}\n[comparison]\nkind = \"axis\"\naxis = \"mpk\"\nbaseline = \"a\"\ntreatment = \"b\"\n"
        );
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_rejects_duplicate_axis_values() {
        let toml = r#"
            [dataset]
            name = "x"
            root = "x"
            columns = ["a", "b"]

            [[axes]]
            name = "access"
            values = ["read", "read"]
        "#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn test_rejects_missing_axes() {
        let toml = r#"
            axes = []

            [dataset]
            name = "x"
            root = "x"
            columns = ["a"]
        "#;
        assert!(Config::from_str(toml).is_err());
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!("{MINIMAL}\n[cache]\npath = \"snap.json\"\n");
        let config_path = dir.path().join("experiment.toml");
        fs::write(&config_path, toml).unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.dataset.root, dir.path().join("fakeptr"));
        assert_eq!(config.cache_path(), Some(dir.path().join("snap.json").as_path()));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/experiment.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
