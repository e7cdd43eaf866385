//! Strategy sweep: several selection strategies over the same data.
//!
//! Every run shares one load and one [`NetworkCache`], so a year slice that
//! two strategies both need is built once. Runs execute in parallel with
//! rayon unless disabled.

use netfolio_core::centrality::CancellationToken;
use netfolio_core::{PerformanceStats, SelectionStrategy};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::cache::NetworkCache;
use crate::config::RunConfig;
use crate::data_loader::LoadedContext;
use crate::runner::{run_on_context, RunError, RunOutput};

/// The two canonical strategies with their default parameters.
pub fn default_strategies() -> Vec<SelectionStrategy> {
    vec![
        SelectionStrategy::default(),
        SelectionStrategy::combined_score(15),
    ]
}

/// Sweep executor.
pub struct StrategySweep {
    cache: NetworkCache,
    parallel: bool,
    cancel: CancellationToken,
}

impl Default for StrategySweep {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategySweep {
    pub fn new() -> Self {
        Self {
            cache: NetworkCache::new(),
            parallel: true,
            cancel: CancellationToken::new(),
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Token that stops every run of this sweep when cancelled.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cache(&self) -> &NetworkCache {
        &self.cache
    }

    /// Run `base` once per strategy over `loaded`.
    pub fn sweep(
        &self,
        base: &RunConfig,
        strategies: &[SelectionStrategy],
        loaded: &LoadedContext,
    ) -> Result<SweepResults, RunError> {
        let configs: Vec<RunConfig> = strategies
            .iter()
            .map(|s| RunConfig {
                selection: s.clone(),
                ..base.clone()
            })
            .collect();
        for config in &configs {
            config.validate()?;
        }

        let run = |config: &RunConfig| run_on_context(config, loaded, &self.cache, &self.cancel);
        let outputs: Vec<RunOutput> = if self.parallel {
            configs.par_iter().map(run).collect::<Result<Vec<_>, _>>()?
        } else {
            configs.iter().map(run).collect::<Result<Vec<_>, _>>()?
        };

        info!(
            runs = outputs.len(),
            networks_built = self.cache.builds(),
            cache_hits = self.cache.hits(),
            "sweep complete"
        );
        Ok(SweepResults { outputs })
    }
}

/// One row of a sweep comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub strategy: String,
    pub run_id: String,
    pub central: PerformanceStats,
    pub peripheral: PerformanceStats,
    /// Central minus peripheral validation Sharpe ratio.
    pub sharpe_spread: f64,
}

/// Results of a sweep, in strategy order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    outputs: Vec<RunOutput>,
}

impl SweepResults {
    pub fn all(&self) -> &[RunOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Validation performance per strategy.
    pub fn comparison(&self) -> Vec<SweepRow> {
        self.outputs
            .iter()
            .map(|o| {
                let perf = &o.analysis.report.performance;
                SweepRow {
                    strategy: o.metadata.strategy.clone(),
                    run_id: o.metadata.run_id.clone(),
                    central: perf.central.validation,
                    peripheral: perf.peripheral.validation,
                    sharpe_spread: perf.central.validation.sharpe_ratio
                        - perf.peripheral.validation.sharpe_ratio,
                }
            })
            .collect()
    }

    /// The run whose central portfolio had the best validation Sharpe.
    pub fn best_central(&self) -> Option<&RunOutput> {
        self.outputs.iter().max_by(|a, b| {
            let sa = a.analysis.report.performance.central.validation.sharpe_ratio;
            let sb = b.analysis.report.performance.central.validation.sharpe_ratio;
            sa.total_cmp(&sb)
        })
    }
}
