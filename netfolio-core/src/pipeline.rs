//! The `analyze` operation: price tables in, portfolios and performance out.
//!
//! Everything an analysis needs arrives through [`AnalysisContext`] and
//! [`AnalysisConfig`]; nothing is kept between calls. Network construction
//! goes through a [`NetworkSource`] so a caller can share built networks
//! between analyses of the same data.

use crate::centrality::{
    compute_with_cancel, distance_criteria, CancellationToken, CentralityConfig, CentralityScores,
    DistanceCriteria,
};
use crate::domain::{PriceMatrix, Symbol};
use crate::fingerprint::{dataset_hash, ConfigHash, DatasetHash};
use crate::network::{build_network, NetworkError, NetworkSummary, PeriodNetwork};
use crate::performance::{evaluate, PerformanceStats};
use crate::selection::{
    select, DistanceRanking, PeriodSignal, SelectionError, SelectionScope, SelectionStrategy,
    StockClassification,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("price data unavailable: {0}")]
    DataUnavailable(String),

    #[error("degenerate input: {0}")]
    Degenerate(#[from] NetworkError),

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),

    #[error("selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("analysis cancelled")]
    Cancelled,
}

/// The price data one analysis runs over.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    /// Table the networks are built from and yearly performance is measured on.
    pub historical: PriceMatrix,
    /// Held-out table used only for validation performance.
    pub validation: PriceMatrix,
}

impl AnalysisContext {
    pub fn new(historical: PriceMatrix, validation: PriceMatrix) -> Self {
        Self {
            historical,
            validation,
        }
    }
}

/// Widest explicit year range an analysis accepts.
pub const MAX_PERIOD_YEARS: i64 = 200;

/// Calendar years to analyze. Unset bounds fall back to the years present in
/// the historical table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_year: Option<i32>,
}

impl PeriodRange {
    pub fn years(first_year: i32, last_year: i32) -> Self {
        Self {
            first_year: Some(first_year),
            last_year: Some(last_year),
        }
    }

    /// Resolve against the years a table actually covers.
    ///
    /// With both bounds set every year in between is returned even when the
    /// table lacks it; such a period is later skipped as degenerate.
    pub fn resolve(&self, available: &[i32]) -> Vec<i32> {
        match (self.first_year, self.last_year) {
            (Some(first), Some(last)) => (first..=last).collect(),
            (first, last) => available
                .iter()
                .copied()
                .filter(|y| first.map_or(true, |f| *y >= f) && last.map_or(true, |l| *y <= l))
                .collect(),
        }
    }
}

/// Parameters of one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub selection: SelectionStrategy,
    #[serde(default)]
    pub centrality: CentralityConfig,
    #[serde(default)]
    pub periods: PeriodRange,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.selection
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        if let (Some(first), Some(last)) = (self.periods.first_year, self.periods.last_year) {
            if first > last {
                return Err(AnalysisError::InvalidConfig(format!(
                    "first_year {first} is after last_year {last}"
                )));
            }
            let span = i64::from(last) - i64::from(first) + 1;
            if span > MAX_PERIOD_YEARS {
                return Err(AnalysisError::InvalidConfig(format!(
                    "year range {first}..={last} spans {span} years, at most {MAX_PERIOD_YEARS} allowed"
                )));
            }
        }
        if !(self.centrality.tolerance > 0.0 && self.centrality.tolerance.is_finite()) {
            return Err(AnalysisError::InvalidConfig(
                "centrality tolerance must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Canonical JSON hash; identical configs share a hash.
    pub fn config_hash(&self) -> ConfigHash {
        let json = serde_json::to_string(self).expect("AnalysisConfig must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }
}

/// Where period networks come from.
pub trait NetworkSource: Send + Sync {
    fn network(&self, prices: &PriceMatrix) -> Result<Arc<PeriodNetwork>, NetworkError>;
}

/// Builds every network from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshNetworks;

impl NetworkSource for FreshNetworks {
    fn network(&self, prices: &PriceMatrix) -> Result<Arc<PeriodNetwork>, NetworkError> {
        build_network(prices).map(Arc::new)
    }
}

// ─── Report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub portfolios: PortfolioLists,
    pub performance: PerformanceSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioLists {
    pub central_portfolio: Vec<Symbol>,
    pub peripheral_portfolio: Vec<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSection {
    pub central: PortfolioPerformance,
    pub peripheral: PortfolioPerformance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    /// Keyed by period label (the calendar year).
    pub yearly: BTreeMap<String, PerformanceStats>,
    pub validation: PerformanceStats,
}

impl PortfolioPerformance {
    fn measure(
        symbols: &[Symbol],
        historical: &PriceMatrix,
        years: &[i32],
        validation: &PriceMatrix,
    ) -> Self {
        Self {
            yearly: years
                .iter()
                .map(|&y| (y.to_string(), evaluate(symbols, &historical.year(y))))
                .collect(),
            validation: evaluate(symbols, validation),
        }
    }
}

/// What happened to one period's network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodDiagnostics {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSummary>,
    /// Reference symbol chosen by each distance criterion.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<String, Symbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvector_error: Option<String>,
    /// Why the period produced no signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDiagnostics {
    pub strategy: String,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub periods: Vec<PeriodDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<StockClassification>,
    pub distance_ranking: DistanceRanking,
    pub overlap: Vec<Symbol>,
    pub warnings: Vec<String>,
}

/// A finished analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub report: AnalysisReport,
    pub diagnostics: AnalysisDiagnostics,
}

// ─── Operations ─────────────────────────────────────────────────────

/// Run one analysis, building every network fresh.
pub fn analyze(ctx: &AnalysisContext, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    analyze_with(ctx, config, &FreshNetworks, &CancellationToken::new())
}

pub fn analyze_with(
    ctx: &AnalysisContext,
    config: &AnalysisConfig,
    source: &dyn NetworkSource,
    cancel: &CancellationToken,
) -> Result<Analysis, AnalysisError> {
    config.validate()?;
    if ctx.historical.is_empty() {
        return Err(AnalysisError::DataUnavailable(
            "historical price table is empty".into(),
        ));
    }
    if ctx.validation.is_empty() {
        return Err(AnalysisError::DataUnavailable(
            "validation price table is empty".into(),
        ));
    }

    let years = config.periods.resolve(&ctx.historical.years());
    if years.is_empty() {
        return Err(AnalysisError::DataUnavailable(
            "no historical data inside the configured years".into(),
        ));
    }

    info!(
        strategy = config.selection.name(),
        symbols = ctx.historical.n_symbols(),
        periods = years.len(),
        "starting analysis"
    );

    let mut periods = Vec::new();
    let mut warnings = Vec::new();
    let mut ranking = DistanceRanking::new();
    let mut signals = Vec::new();

    match config.selection.scope() {
        SelectionScope::PerPeriod => {
            for &year in &years {
                if cancel.is_cancelled() {
                    return Err(AnalysisError::Cancelled);
                }
                let label = year.to_string();
                match source.network(&ctx.historical.year(year)) {
                    Ok(network) => {
                        let (signal, diag) =
                            score_period(label, &network, &config.centrality, cancel, &mut ranking);
                        periods.push(diag);
                        signals.push(signal);
                    }
                    Err(e) => {
                        warn!(year, error = %e, "skipping period");
                        warnings.push(format!("period {label} skipped: {e}"));
                        periods.push(PeriodDiagnostics {
                            label,
                            network: None,
                            references: BTreeMap::new(),
                            eigenvector_error: None,
                            skipped: Some(e.to_string()),
                        });
                    }
                }
            }
        }
        SelectionScope::FullSpan => {
            let slice = span_of(&ctx.historical, &years);
            let network = source.network(&slice)?;
            let label = match (years.first(), years.last()) {
                (Some(a), Some(b)) if a != b => format!("{a}-{b}"),
                (Some(a), _) => a.to_string(),
                _ => String::new(),
            };
            let (signal, diag) =
                score_period(label, &network, &config.centrality, cancel, &mut ranking);
            periods.push(diag);
            signals.push(signal);
        }
    }

    if signals.is_empty() {
        warnings.push("no period produced a network; portfolios are empty".into());
    }
    for diag in &periods {
        if let Some(e) = &diag.eigenvector_error {
            warnings.push(format!("period {}: eigenvector centrality omitted: {e}", diag.label));
        }
        if let Some(summary) = &diag.network {
            if !summary.clamped.is_empty() {
                warnings.push(format!(
                    "period {}: undefined correlations clamped for {}",
                    diag.label,
                    summary.clamped.join(", ")
                ));
            }
        }
    }

    let outcome = select(&config.selection, &signals)?;
    if !outcome.overlap.is_empty() {
        warnings.push(format!(
            "central and peripheral portfolios share {} stocks",
            outcome.overlap.len()
        ));
    }

    let central = PortfolioPerformance::measure(
        &outcome.central.symbols,
        &ctx.historical,
        &years,
        &ctx.validation,
    );
    let peripheral = PortfolioPerformance::measure(
        &outcome.peripheral.symbols,
        &ctx.historical,
        &years,
        &ctx.validation,
    );

    info!(
        central = outcome.central.len(),
        peripheral = outcome.peripheral.len(),
        central_validation_sharpe = central.validation.sharpe_ratio,
        peripheral_validation_sharpe = peripheral.validation.sharpe_ratio,
        "analysis complete"
    );

    let report = AnalysisReport {
        portfolios: PortfolioLists {
            central_portfolio: outcome.central.symbols,
            peripheral_portfolio: outcome.peripheral.symbols,
        },
        performance: PerformanceSection {
            central,
            peripheral,
        },
    };
    let diagnostics = AnalysisDiagnostics {
        strategy: config.selection.name().to_string(),
        config_hash: config.config_hash(),
        dataset_hash: dataset_hash(&ctx.historical),
        periods,
        classification: outcome.classification,
        distance_ranking: ranking,
        overlap: outcome.overlap,
        warnings,
    };
    Ok(Analysis {
        report,
        diagnostics,
    })
}

/// Centralities and distance criteria of one price span, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanInspection {
    pub network: NetworkSummary,
    pub centrality: CentralityScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_criteria: Option<DistanceCriteria>,
}

pub fn inspect(
    prices: &PriceMatrix,
    config: &CentralityConfig,
) -> Result<SpanInspection, NetworkError> {
    let network = build_network(prices)?;
    let centrality = compute_with_cancel(&network.graph, config, &CancellationToken::new());
    Ok(SpanInspection {
        network: network.summary(),
        distance_criteria: distance_criteria(&network.graph, &network.correlation),
        centrality,
    })
}

fn score_period(
    label: String,
    network: &PeriodNetwork,
    config: &CentralityConfig,
    cancel: &CancellationToken,
    ranking: &mut DistanceRanking,
) -> (PeriodSignal, PeriodDiagnostics) {
    let scores = compute_with_cancel(&network.graph, config, cancel);
    let mut references = BTreeMap::new();
    if let Some(criteria) = distance_criteria(&network.graph, &network.correlation) {
        ranking.record(&criteria);
        for (name, reference) in criteria.iter() {
            references.insert(name.to_string(), reference.reference.clone());
        }
    }
    debug!(
        period = %label,
        symbols = network.graph.node_count(),
        observations = network.observations,
        "scored period network"
    );
    let diag = PeriodDiagnostics {
        label: label.clone(),
        network: Some(network.summary()),
        references,
        eigenvector_error: scores.eigenvector_error().map(|e| e.to_string()),
        skipped: None,
    };
    (PeriodSignal { label, scores }, diag)
}

/// Rows of `prices` from 1 January of the first year to 31 December of the
/// last.
fn span_of(prices: &PriceMatrix, years: &[i32]) -> PriceMatrix {
    let bounds = years
        .first()
        .and_then(|&y| NaiveDate::from_ymd_opt(y, 1, 1))
        .zip(years.last().and_then(|&y| NaiveDate::from_ymd_opt(y, 12, 31)));
    match bounds {
        Some((start, end)) => prices.between(start, end),
        None => prices.clone(),
    }
}
