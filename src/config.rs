//! Benchmark run configuration.
//!
//! Defaults reproduce the reference run over the Higgs boson test set. A JSON
//! file may override any subset of fields; command-line flags override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::CsvOptions;
use crate::utils::Parallelism;

/// Invalid run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("num_cols must be at least 1")]
    ZeroColumns,

    #[error("num_rows must be at least 1 when set")]
    ZeroRows,
}

/// Everything a benchmark run needs besides the evaluator choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub output_path: PathBuf,
    /// Rows to read. `None` reads the whole file.
    pub num_rows: Option<usize>,
    pub num_cols: usize,
    /// Sentinel in the data file that stands for a missing value.
    pub missing_value: f32,
    pub has_header: bool,
    /// Worker threads. 0 = all cores, 1 = sequential.
    pub threads: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("../higgs-boson/data/test_raw.csv"),
            model_path: PathBuf::from("../higgs-boson/higgs-model-single-depth-3.txt"),
            output_path: PathBuf::from("predictions.csv"),
            num_rows: Some(550_000),
            num_cols: 30,
            missing_value: -999.0,
            has_header: false,
            threads: 1,
        }
    }
}

impl BenchConfig {
    /// Load a JSON config. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cols == 0 {
            return Err(ConfigError::ZeroColumns);
        }
        if self.num_rows == Some(0) {
            return Err(ConfigError::ZeroRows);
        }
        Ok(())
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            num_cols: self.num_cols,
            num_rows: self.num_rows,
            missing_value: Some(self.missing_value),
            has_header: self.has_header,
            ..CsvOptions::default()
        }
    }

    pub fn parallelism(&self) -> Parallelism {
        Parallelism::from_threads(self.threads)
    }
}
