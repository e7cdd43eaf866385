//! Netfolio Runner — analysis orchestration on top of `netfolio-core`.
//!
//! This crate provides:
//! - TOML run configuration
//! - Price-table loading with synthetic fallback
//! - A content-addressed network cache shared between analyses
//! - Single runs and parallel strategy sweeps
//! - JSON/CSV export of reports and diagnostics

pub mod cache;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use cache::NetworkCache;
pub use config::{ConfigError, DataConfig, DateSpan, OutputConfig, RunConfig, RunId};
pub use data_loader::{load_context, DataSource, LoadError, LoadOptions, LoadedContext, PriceLoader};
pub use export::{classification_csv, sweep_csv, write_run};
pub use runner::{run_analysis, run_on_context, RunError, RunMetadata, RunOutput};
pub use sweep::{default_strategies, StrategySweep, SweepResults, SweepRow};
pub use synthetic::{write_price_csv, SyntheticMarket};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn network_cache_is_send_sync() {
        assert_send::<NetworkCache>();
        assert_sync::<NetworkCache>();
    }

    #[test]
    fn run_output_is_send_sync() {
        assert_send::<RunOutput>();
        assert_sync::<RunOutput>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }

    #[test]
    fn sweep_is_send_sync() {
        assert_send::<StrategySweep>();
        assert_sync::<StrategySweep>();
        assert_send::<LoadedContext>();
        assert_sync::<LoadedContext>();
    }
}
