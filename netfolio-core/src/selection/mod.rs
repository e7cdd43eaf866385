//! Portfolio selection from centrality signal.
//!
//! Two strategies behind one entry point:
//! - `MultiPeriod` classifies stocks in every period's own network and keeps
//!   the ones that are consistently central or peripheral.
//! - `CombinedScore` ranks a single full-span network by
//!   `(degree + betweenness) / 2` and takes the two ends.

mod combined;
mod distance_ranking;
mod multi_period;

pub use combined::{rank_by_combined_score, select_combined};
pub use distance_ranking::{DistanceRanking, NearFar, NEAR_HOPS};
pub use multi_period::{PeriodCounts, StockClassification};

use crate::centrality::CentralityScores;
use crate::domain::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioKind {
    Central,
    Peripheral,
}

impl std::fmt::Display for PortfolioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortfolioKind::Central => write!(f, "central"),
            PortfolioKind::Peripheral => write!(f, "peripheral"),
        }
    }
}

/// An equal-weighted set of stocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub kind: PortfolioKind,
    pub symbols: Vec<Symbol>,
}

impl Portfolio {
    pub fn empty(kind: PortfolioKind) -> Self {
        Self {
            kind,
            symbols: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// How portfolios are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionStrategy {
    MultiPeriod {
        /// Percentile threshold for the central criterion, in (0, 100].
        #[serde(default = "default_percentile")]
        percentile: f64,
        #[serde(default = "default_min_periods")]
        min_periods: usize,
        #[serde(default = "default_portfolio_size")]
        target_size: usize,
    },
    CombinedScore {
        #[serde(default = "default_portfolio_size")]
        size: usize,
    },
}

fn default_percentile() -> f64 {
    90.0
}

fn default_min_periods() -> usize {
    5
}

fn default_portfolio_size() -> usize {
    15
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::MultiPeriod {
            percentile: default_percentile(),
            min_periods: default_min_periods(),
            target_size: default_portfolio_size(),
        }
    }
}

/// What a strategy needs from the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionScope {
    /// One network per analysis period.
    PerPeriod,
    /// One network over the whole historical table.
    FullSpan,
}

impl SelectionStrategy {
    pub fn combined_score(size: usize) -> Self {
        SelectionStrategy::CombinedScore { size }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SelectionStrategy::MultiPeriod { .. } => "multi_period",
            SelectionStrategy::CombinedScore { .. } => "combined_score",
        }
    }

    pub fn scope(&self) -> SelectionScope {
        match self {
            SelectionStrategy::MultiPeriod { .. } => SelectionScope::PerPeriod,
            SelectionStrategy::CombinedScore { .. } => SelectionScope::FullSpan,
        }
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        match *self {
            SelectionStrategy::MultiPeriod {
                percentile,
                target_size,
                ..
            } => {
                if !(percentile > 0.0 && percentile <= 100.0) {
                    return Err(SelectionError::InvalidStrategy(format!(
                        "percentile must be in (0, 100], got {percentile}"
                    )));
                }
                if target_size == 0 {
                    return Err(SelectionError::InvalidStrategy(
                        "target_size must be at least 1".into(),
                    ));
                }
            }
            SelectionStrategy::CombinedScore { size } => {
                if size == 0 {
                    return Err(SelectionError::InvalidStrategy(
                        "size must be at least 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionError {
    #[error("invalid selection strategy: {0}")]
    InvalidStrategy(String),

    #[error("combined-score selection needs exactly one signal, got {0}")]
    ExpectedSingleSignal(usize),
}

/// Centrality of one analysis period (or the whole span).
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSignal {
    pub label: String,
    pub scores: CentralityScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOutcome {
    pub central: Portfolio,
    pub peripheral: Portfolio,
    /// Per-stock counts, multi-period only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<StockClassification>,
    /// Stocks present in both portfolios.
    pub overlap: Vec<Symbol>,
}

/// Choose central and peripheral portfolios.
///
/// Multi-period selection over zero signals yields two empty portfolios.
pub fn select(
    strategy: &SelectionStrategy,
    signals: &[PeriodSignal],
) -> Result<SelectionOutcome, SelectionError> {
    strategy.validate()?;

    let (central, peripheral, classification) = match *strategy {
        SelectionStrategy::MultiPeriod {
            percentile,
            min_periods,
            target_size,
        } => {
            let mut classification = StockClassification::new();
            for signal in signals {
                classification.record(&signal.scores, percentile);
            }
            let qualified_central = classification.qualified(PortfolioKind::Central, min_periods);
            let qualified_peripheral =
                classification.qualified(PortfolioKind::Peripheral, min_periods);
            if qualified_central.len() < target_size || qualified_peripheral.len() < target_size {
                warn!(
                    central = qualified_central.len(),
                    peripheral = qualified_peripheral.len(),
                    min_periods,
                    target_size,
                    "too few qualifying stocks, backfilling from period ranking"
                );
            }
            let (central, peripheral) = classification.portfolios(min_periods, target_size);
            (central, peripheral, Some(classification))
        }
        SelectionStrategy::CombinedScore { size } => {
            let [signal] = signals else {
                return Err(SelectionError::ExpectedSingleSignal(signals.len()));
            };
            let (central, peripheral) = select_combined(&signal.scores, size);
            (central, peripheral, None)
        }
    };

    let peripheral_set: BTreeSet<&Symbol> = peripheral.symbols.iter().collect();
    let overlap: Vec<Symbol> = central
        .symbols
        .iter()
        .filter(|s| peripheral_set.contains(s))
        .cloned()
        .collect();
    if !overlap.is_empty() {
        warn!(
            strategy = strategy.name(),
            overlap = overlap.len(),
            "central and peripheral portfolios overlap"
        );
    }

    Ok(SelectionOutcome {
        central,
        peripheral,
        classification,
        overlap,
    })
}
