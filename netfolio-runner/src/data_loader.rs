//! Price-table loading and data resolution for the runner.
//!
//! Given the `[data]` section of a run config, loads the historical and
//! validation tables and cuts them to their spans. Implements the fallback
//! policy:
//! 1. If the file exists → read it (CSV or Parquet)
//! 2. If not and `synthetic` is set → generate a synthetic market (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only demo mode. Results produced on it are
//! tagged so they are never mistaken for real analyses.

use crate::config::{DataConfig, DateSpan};
use crate::synthetic::SyntheticMarket;
use chrono::Datelike;
use netfolio_core::data::{read_price_table, IngestError, IngestedTable};
use netfolio_core::fingerprint::{dataset_hash, DatasetHash};
use netfolio_core::pipeline::AnalysisContext;
use netfolio_core::{PriceMatrix, Symbol};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("price file '{}' not found (use --synthetic for synthetic data)", .0.display())]
    NotFound(PathBuf),

    #[error("no prices in '{}' between {start} and {end}", path.display())]
    EmptySpan {
        path: PathBuf,
        start: String,
        end: String,
    },

    #[error("synthetic market: {0}")]
    Synthetic(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Options controlling how tables are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// If true, generate a synthetic market when a file is missing.
    pub synthetic: bool,
    /// Number of symbols in a generated market.
    pub synthetic_symbols: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            synthetic: false,
            synthetic_symbols: 40,
        }
    }
}

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    File,
    Synthetic,
}

/// A file-backed price table.
#[derive(Debug, Clone)]
pub struct PriceLoader {
    path: PathBuf,
}

impl PriceLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the table and cut it to `span`.
    pub fn load(&self, span: Option<DateSpan>) -> Result<IngestedTable, LoadError> {
        if !self.path.exists() {
            return Err(LoadError::NotFound(self.path.clone()));
        }
        let table = read_price_table(&self.path)?;
        let prices = cut(&self.path, table.prices, span)?;
        Ok(IngestedTable {
            prices,
            dropped: table.dropped,
        })
    }
}

fn cut(path: &Path, prices: PriceMatrix, span: Option<DateSpan>) -> Result<PriceMatrix, LoadError> {
    let prices = match span {
        Some(span) => prices.between(span.start, span.end),
        None => prices,
    };
    if prices.n_rows() == 0 {
        let (start, end) = span
            .map(|s| (s.start.to_string(), s.end.to_string()))
            .unwrap_or_else(|| ("-".into(), "-".into()));
        return Err(LoadError::EmptySpan {
            path: path.to_path_buf(),
            start,
            end,
        });
    }
    Ok(prices)
}

/// Both tables of a run, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedContext {
    pub context: AnalysisContext,
    /// Symbols dropped from either table for missing prices.
    pub dropped: Vec<Symbol>,
    pub historical_hash: DatasetHash,
    pub validation_hash: DatasetHash,
    pub historical_source: DataSource,
    pub validation_source: DataSource,
}

impl LoadedContext {
    pub fn has_synthetic(&self) -> bool {
        self.historical_source == DataSource::Synthetic
            || self.validation_source == DataSource::Synthetic
    }
}

/// Load the historical and validation tables named by `data`.
pub fn load_context(data: &DataConfig, opts: &LoadOptions) -> Result<LoadedContext, LoadError> {
    let historical = load_one(&data.historical, data.historical_span, data, opts, Role::Historical)?;
    let validation = load_one(&data.validation, data.validation_span, data, opts, Role::Validation)?;

    let mut dropped: Vec<Symbol> = historical
        .0
        .dropped
        .iter()
        .chain(&validation.0.dropped)
        .cloned()
        .collect();
    dropped.sort();
    dropped.dedup();

    let loaded = LoadedContext {
        historical_hash: dataset_hash(&historical.0.prices),
        validation_hash: dataset_hash(&validation.0.prices),
        historical_source: historical.1,
        validation_source: validation.1,
        context: AnalysisContext::new(historical.0.prices, validation.0.prices),
        dropped,
    };
    info!(
        historical_rows = loaded.context.historical.n_rows(),
        historical_symbols = loaded.context.historical.n_symbols(),
        validation_rows = loaded.context.validation.n_rows(),
        synthetic = loaded.has_synthetic(),
        dataset = loaded.historical_hash.short(),
        "loaded price tables"
    );
    Ok(loaded)
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Historical,
    Validation,
}

fn load_one(
    path: &Path,
    span: Option<DateSpan>,
    data: &DataConfig,
    opts: &LoadOptions,
    role: Role,
) -> Result<(IngestedTable, DataSource), LoadError> {
    match PriceLoader::new(path).load(span) {
        Ok(table) => Ok((table, DataSource::File)),
        Err(LoadError::NotFound(missing)) if opts.synthetic => {
            warn!(path = %missing.display(), "price file missing, generating synthetic data");
            let market = synthetic_market(data, opts)?;
            let span = span.or_else(|| default_span(data, role));
            let prices = cut(&missing, market, span)?;
            Ok((
                IngestedTable {
                    prices,
                    dropped: Vec::new(),
                },
                DataSource::Synthetic,
            ))
        }
        Err(e) => Err(e),
    }
}

/// One market covering both spans, so the two tables share symbols and are
/// contiguous.
fn synthetic_market(data: &DataConfig, opts: &LoadOptions) -> Result<PriceMatrix, LoadError> {
    let historical = data
        .historical_span
        .or_else(|| default_span(data, Role::Historical))
        .ok_or_else(|| LoadError::Synthetic("no historical span".into()))?;
    let validation = data
        .validation_span
        .or_else(|| default_span(data, Role::Validation))
        .ok_or_else(|| LoadError::Synthetic("no validation span".into()))?;

    SyntheticMarket::new(
        opts.synthetic_symbols,
        historical.start.min(validation.start),
        historical.end.max(validation.end),
    )
    .with_seed(data.historical.to_string_lossy())
    .generate()
    .map_err(|e| LoadError::Synthetic(e.to_string()))
}

/// Ten historical years followed by one validation year.
fn default_span(data: &DataConfig, role: Role) -> Option<DateSpan> {
    match role {
        Role::Historical => DateSpan::years(2011, 2020),
        Role::Validation => match data.historical_span {
            Some(h) => {
                let year = h.end.year() + 1;
                DateSpan::years(year, year)
            }
            None => DateSpan::years(2021, 2021),
        },
    }
}
