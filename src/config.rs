use crate::parse::CsvDialect;
use crate::profile::{DEFAULT_SAMPLE_SIZE, DEFAULT_TYPE_THRESHOLD};
use crate::{ExplorerError, ExplorerResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

fn default_preview_rows() -> usize {
    10
}

fn default_preview_columns() -> usize {
    6
}

/// Sample size and the ratios a column must exceed to count as numeric/date.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub sample_size: usize,
    pub numeric_threshold: f64,
    pub date_threshold: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            numeric_threshold: DEFAULT_TYPE_THRESHOLD,
            date_threshold: DEFAULT_TYPE_THRESHOLD,
        }
    }
}

impl ProfilerConfig {
    pub fn validate(&self) -> ExplorerResult<()> {
        if self.sample_size < 1 {
            return Err(ExplorerError::InvalidArgument(format!(
                "sample size must be at least 1, got {}",
                self.sample_size
            )));
        }
        for (name, value) in [
            ("numeric threshold", self.numeric_threshold),
            ("date threshold", self.date_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ExplorerError::InvalidArgument(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub profiler: ProfilerConfig,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_preview_columns")]
    pub preview_columns: usize,
    #[serde(default)]
    pub dialect: CsvDialect,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            profiler: ProfilerConfig::default(),
            preview_rows: default_preview_rows(),
            preview_columns: default_preview_columns(),
            dialect: CsvDialect::default(),
        }
    }
}

/// Parsed value of `key`, `None` when unset.
fn env_value<T>(key: &str) -> ExplorerResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ExplorerError::InvalidArgument(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}

impl ExplorerConfig {
    /// Defaults overridden by `EXPLORER_*` variables from the environment or
    /// a `.env` file.
    pub fn from_env() -> ExplorerResult<Self> {
        dotenv().ok();

        let mut config = Self::default();
        if let Some(v) = env_value("EXPLORER_SAMPLE_SIZE")? {
            config.profiler.sample_size = v;
        }
        if let Some(v) = env_value("EXPLORER_NUMERIC_THRESHOLD")? {
            config.profiler.numeric_threshold = v;
        }
        if let Some(v) = env_value("EXPLORER_DATE_THRESHOLD")? {
            config.profiler.date_threshold = v;
        }
        if let Some(v) = env_value("EXPLORER_PREVIEW_ROWS")? {
            config.preview_rows = v;
        }
        if let Some(v) = env_value("EXPLORER_PREVIEW_COLUMNS")? {
            config.preview_columns = v;
        }
        if let Some(v) = env_value("EXPLORER_CSV_DIALECT")? {
            config.dialect = v;
        }
        config.profiler.validate()?;
        Ok(config)
    }

    /// Load from a JSON document; omitted keys keep their defaults.
    pub fn from_json_file(path: &Path) -> ExplorerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            ExplorerError::InvalidArgument(format!("config {}: {e}", path.display()))
        })?;
        config.profiler.validate()?;
        Ok(config)
    }
}
