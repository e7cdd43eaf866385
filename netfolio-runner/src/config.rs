//! Serializable run configuration, read from TOML.
//!
//! ```toml
//! [data]
//! historical = "data/historical.csv"
//! validation = "data/validation.csv"
//! historical_span = { start = "2011-01-01", end = "2020-12-31" }
//!
//! [periods]
//! first_year = 2011
//! last_year = 2020
//!
//! [selection]
//! type = "multi_period"
//! percentile = 90.0
//! min_periods = 5
//! target_size = 15
//!
//! [centrality]
//! eigenvector = true
//!
//! [output]
//! dir = "out"
//! ```
//!
//! Every section except `[data]` may be omitted.

use chrono::NaiveDate;
use netfolio_core::pipeline::{AnalysisConfig, PeriodRange};
use netfolio_core::{CentralityConfig, SelectionStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a run (content hash of its configuration).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot write TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclusive date span used to cut a price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whole calendar years `first..=last`.
    pub fn years(first: i32, last: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(first, 1, 1)?,
            end: NaiveDate::from_ymd_opt(last, 12, 31)?,
        })
    }
}

/// Where the two price tables come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub historical: PathBuf,
    pub validation: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_span: Option<DateSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_span: Option<DateSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Everything needed to reproduce one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub periods: PeriodRange,
    #[serde(default)]
    pub selection: SelectionStrategy,
    #[serde(default)]
    pub centrality: CentralityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RunConfig {
    /// A config with default analysis settings over the given tables.
    pub fn new(historical: impl Into<PathBuf>, validation: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig {
                historical: historical.into(),
                validation: validation.into(),
                historical_span: None,
                validation_span: None,
            },
            periods: PeriodRange::default(),
            selection: SelectionStrategy::default(),
            centrality: CentralityConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        Ok(config.relative_to(path.parent().unwrap_or(Path::new(""))))
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, span) in [
            ("historical_span", self.data.historical_span),
            ("validation_span", self.data.validation_span),
        ] {
            if let Some(span) = span {
                if span.start > span.end {
                    return Err(ConfigError::Invalid(format!(
                        "{name} starts {} after it ends {}",
                        span.start, span.end
                    )));
                }
            }
        }
        self.analysis_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The analysis parameters, without data locations.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            selection: self.selection.clone(),
            centrality: self.centrality.clone(),
            periods: self.periods,
        }
    }

    /// Deterministic hash of the whole config, data paths included.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Resolve relative data and output paths against `base`.
    fn relative_to(mut self, base: &Path) -> Self {
        for path in [
            &mut self.data.historical,
            &mut self.data.validation,
            &mut self.output.dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[data]
historical = "hist.csv"
validation = "val.csv"
historical_span = { start = "2011-01-01", end = "2013-12-31" }

[periods]
first_year = 2011
last_year = 2013

[selection]
type = "combined_score"
size = 10

[centrality]
eigenvector = false

[output]
dir = "results"
"#;

    #[test]
    fn parses_full_config() {
        let config = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(config.selection, SelectionStrategy::combined_score(10));
        assert_eq!(config.periods, PeriodRange::years(2011, 2013));
        assert!(!config.centrality.eigenvector);
        assert_eq!(config.data.historical_span, DateSpan::years(2011, 2013));
        assert_eq!(config.data.validation_span, None);
        assert_eq!(config.output.dir, PathBuf::from("results"));
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = RunConfig::from_toml(
            "[data]\nhistorical = \"h.csv\"\nvalidation = \"v.csv\"\n",
        )
        .unwrap();
        assert_eq!(config.selection, SelectionStrategy::default());
        assert_eq!(config.centrality, CentralityConfig::default());
        assert_eq!(config.periods, PeriodRange::default());
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn partial_strategy_takes_defaults() {
        let config = RunConfig::from_toml(
            "[data]\nhistorical = \"h.csv\"\nvalidation = \"v.csv\"\n\n[selection]\ntype = \"multi_period\"\ntarget_size = 5\n",
        )
        .unwrap();
        assert_eq!(
            config.selection,
            SelectionStrategy::MultiPeriod {
                percentile: 90.0,
                min_periods: 5,
                target_size: 5,
            }
        );
    }

    #[test]
    fn toml_round_trip() {
        let config = RunConfig::from_toml(FULL).unwrap();
        let text = config.to_toml().unwrap();
        assert_eq!(RunConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_percentile = FULL.replace(
            "type = \"combined_score\"\nsize = 10",
            "type = \"multi_period\"\npercentile = 0.0",
        );
        assert!(matches!(
            RunConfig::from_toml(&bad_percentile),
            Err(ConfigError::Invalid(_))
        ));

        let inverted = FULL.replace("last_year = 2013", "last_year = 2009");
        assert!(matches!(
            RunConfig::from_toml(&inverted),
            Err(ConfigError::Invalid(_))
        ));

        let endless = FULL.replace("first_year = 2011", "first_year = -100000");
        assert!(matches!(
            RunConfig::from_toml(&endless),
            Err(ConfigError::Invalid(_))
        ));

        let bad_span = FULL.replace("end = \"2013-12-31\"", "end = \"2010-12-31\"");
        assert!(matches!(
            RunConfig::from_toml(&bad_span),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            RunConfig::from_toml("[data]\nhistorical = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_is_deterministic() {
        let a = RunConfig::from_toml(FULL).unwrap();
        let b = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);

        let mut c = a.clone();
        c.selection = SelectionStrategy::combined_score(11);
        assert_ne!(a.run_id(), c.run_id());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, FULL).unwrap();
        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.data.historical, dir.path().join("hist.csv"));
        assert_eq!(config.output.dir, dir.path().join("results"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RunConfig::from_file(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
