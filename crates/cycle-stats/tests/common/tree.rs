//! Directory-tree fixtures for integration tests
//!
//! Builds `<root>/<axis values...>/<repetitions>.csv` layouts in a temporary
//! directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct DatasetTree {
    dir: TempDir,
}

impl DatasetTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Should create temp dir"),
        }
    }

    /// Directory that holds the config file and the `data/` root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Write one leaf file from rows of per-column cycle counts.
    pub fn write_leaf(&self, configuration: &[&str], repetitions: &str, rows: &[&[u64]]) -> PathBuf {
        let dir = configuration
            .iter()
            .fold(self.root(), |dir, value| dir.join(value));
        fs::create_dir_all(&dir).expect("Should create leaf dir");

        let content: String = rows
            .iter()
            .map(|row| {
                let fields: Vec<String> = row.iter().map(ToString::to_string).collect();
                format!("{}\n", fields.join(","))
            })
            .collect();
        let path = dir.join(format!("{repetitions}.csv"));
        fs::write(&path, content).expect("Should write leaf file");
        path
    }

    pub fn write_raw(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Should create parent dir");
        }
        fs::write(&path, content).expect("Should write file");
        path
    }

    /// Write `experiment.toml` next to `data/`.
    pub fn write_config(&self, toml: &str) -> PathBuf {
        self.write_raw("experiment.toml", toml)
    }
}

/// Rows whose columns are given separately, zipped line by line.
pub fn columns(unsafe_cycles: &[u64], safe_cycles: &[u64]) -> Vec<Vec<u64>> {
    unsafe_cycles
        .iter()
        .zip(safe_cycles)
        .map(|(&a, &b)| vec![a, b])
        .collect()
}

pub fn as_rows(rows: &[Vec<u64>]) -> Vec<&[u64]> {
    rows.iter().map(Vec::as_slice).collect()
}
