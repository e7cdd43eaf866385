//! Analysis runner: wires together config, loading, cache and the core
//! pipeline.
//!
//! Two entry points:
//! - `run_analysis()`: loads data named by the config, then runs. Used by CLI.
//! - `run_on_context()`: takes pre-loaded data and a network source. Used by
//!   the sweep so several strategies share one load and one cache.

use netfolio_core::centrality::CancellationToken;
use netfolio_core::fingerprint::DatasetHash;
use netfolio_core::pipeline::{analyze_with, Analysis, AnalysisError, NetworkSource};
use netfolio_core::Symbol;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::cache::NetworkCache;
use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{load_context, LoadError, LoadOptions, LoadedContext};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Current schema version for persisted run metadata.
pub const SCHEMA_VERSION: u32 = 1;

/// Provenance of one run, written next to its report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub historical_hash: DatasetHash,
    pub validation_hash: DatasetHash,
    pub has_synthetic: bool,
    /// Symbols removed at load time for missing prices.
    pub dropped: Vec<Symbol>,
}

/// Complete result of one run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub metadata: RunMetadata,
    pub analysis: Analysis,
}

/// Load the tables named by `config` and analyze them.
pub fn run_analysis(config: &RunConfig, opts: &LoadOptions) -> Result<RunOutput, RunError> {
    config.validate()?;
    let loaded = load_context(&config.data, opts)?;
    let cache = NetworkCache::new();
    run_on_context(config, &loaded, &cache, &CancellationToken::new())
}

/// Analyze already-loaded data, building networks through `source`.
pub fn run_on_context(
    config: &RunConfig,
    loaded: &LoadedContext,
    source: &dyn NetworkSource,
    cancel: &CancellationToken,
) -> Result<RunOutput, RunError> {
    let analysis_config = config.analysis_config();
    let analysis = analyze_with(&loaded.context, &analysis_config, source, cancel)?;

    let metadata = RunMetadata {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        strategy: config.selection.name().to_string(),
        historical_hash: loaded.historical_hash.clone(),
        validation_hash: loaded.validation_hash.clone(),
        has_synthetic: loaded.has_synthetic(),
        dropped: loaded.dropped.clone(),
    };
    info!(
        run_id = &metadata.run_id[..12],
        strategy = %metadata.strategy,
        central = analysis.report.portfolios.central_portfolio.len(),
        peripheral = analysis.report.portfolios.peripheral_portfolio.len(),
        synthetic = metadata.has_synthetic,
        "run complete"
    );
    Ok(RunOutput { metadata, analysis })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateSpan;
    use netfolio_core::pipeline::PeriodRange;
    use netfolio_core::SelectionStrategy;

    fn synthetic_config() -> (RunConfig, LoadOptions) {
        let mut config = RunConfig::new("/nonexistent/h.csv", "/nonexistent/v.csv");
        config.data.historical_span = DateSpan::years(2015, 2017);
        config.data.validation_span = DateSpan::years(2018, 2018);
        config.periods = PeriodRange::years(2015, 2017);
        config.selection = SelectionStrategy::MultiPeriod {
            percentile: 90.0,
            min_periods: 2,
            target_size: 4,
        };
        let opts = LoadOptions {
            synthetic: true,
            synthetic_symbols: 16,
        };
        (config, opts)
    }

    #[test]
    fn runs_on_synthetic_data() {
        let (config, opts) = synthetic_config();
        let output = run_analysis(&config, &opts).unwrap();
        assert!(output.metadata.has_synthetic);
        assert_eq!(output.metadata.strategy, "multi_period");
        assert_eq!(output.metadata.run_id, config.run_id());
        assert!(output.analysis.report.portfolios.central_portfolio.len() >= 4);
        assert_eq!(output.analysis.report.performance.central.yearly.len(), 3);
    }

    #[test]
    fn missing_data_is_data_error() {
        let (config, _) = synthetic_config();
        let err = run_analysis(&config, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, RunError::Data(LoadError::NotFound(_))));
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let (mut config, opts) = synthetic_config();
        config.selection = SelectionStrategy::combined_score(0);
        let err = run_analysis(&config, &opts).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn cached_networks_give_identical_results() {
        let (config, opts) = synthetic_config();
        let loaded = load_context(&config.data, &opts).unwrap();
        let cache = NetworkCache::new();
        let cancel = CancellationToken::new();

        let first = run_on_context(&config, &loaded, &cache, &cancel).unwrap();
        let builds = cache.builds();
        let second = run_on_context(&config, &loaded, &cache, &cancel).unwrap();

        assert_eq!(first.analysis, second.analysis);
        assert_eq!(builds, 3);
        assert_eq!(cache.builds(), builds);
    }
}
