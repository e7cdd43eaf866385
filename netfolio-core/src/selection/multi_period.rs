//! Multi-period classification: count how often each stock is central or
//! peripheral across per-period networks.

use super::{Portfolio, PortfolioKind};
use crate::centrality::CentralityScores;
use crate::domain::Symbol;
use crate::stats::percentile;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodCounts {
    pub central_periods: usize,
    pub peripheral_periods: usize,
}

impl PeriodCounts {
    pub fn count(&self, kind: PortfolioKind) -> usize {
        match kind {
            PortfolioKind::Central => self.central_periods,
            PortfolioKind::Peripheral => self.peripheral_periods,
        }
    }
}

/// Per-stock central/peripheral counts over the analyzed periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockClassification {
    periods: usize,
    stocks: BTreeMap<Symbol, PeriodCounts>,
}

impl StockClassification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one period's centrality into the counts.
    ///
    /// Central: degree or betweenness at or above the `q`-th percentile of
    /// that period. Peripheral: degree equal to the period minimum, or zero
    /// betweenness. A stock can be both in the same period.
    pub fn record(&mut self, scores: &CentralityScores, q: f64) {
        if scores.is_empty() {
            return;
        }
        let degrees = scores.degrees();
        let betweenness = scores.betweenness();
        let (Some(degree_cut), Some(betweenness_cut)) =
            (percentile(&degrees, q), percentile(&betweenness, q))
        else {
            return;
        };
        let min_degree = degrees.iter().copied().fold(f64::INFINITY, f64::min);

        self.periods += 1;
        for (symbol, c) in scores.iter() {
            let counts = self.stocks.entry(symbol.clone()).or_default();
            if c.degree >= degree_cut || c.betweenness >= betweenness_cut {
                counts.central_periods += 1;
            }
            if c.degree == min_degree || c.betweenness == 0.0 {
                counts.peripheral_periods += 1;
            }
        }
    }

    /// Number of periods folded in.
    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn get(&self, symbol: &str) -> Option<&PeriodCounts> {
        self.stocks.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &PeriodCounts)> {
        self.stocks.iter()
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    /// Stocks meeting the criterion in at least `min_periods` periods.
    pub fn qualified(&self, kind: PortfolioKind, min_periods: usize) -> Vec<Symbol> {
        self.stocks
            .iter()
            .filter(|(_, c)| c.count(kind) >= min_periods)
            .map(|(s, _)| s.clone())
            .collect()
    }

    /// All stocks with their fraction of periods meeting the criterion, highest
    /// first, ties by symbol.
    pub fn ranked(&self, kind: PortfolioKind) -> Vec<(Symbol, f64)> {
        let denominator = self.periods.max(1) as f64;
        let mut ranked: Vec<(Symbol, usize)> = self
            .stocks
            .iter()
            .map(|(s, c)| (s.clone(), c.count(kind)))
            .collect();
        // BTreeMap order already sorts by symbol; a stable sort keeps it for ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .map(|(s, n)| (s, n as f64 / denominator))
            .collect()
    }

    /// The `size` best-ranked stocks.
    ///
    /// Stocks that qualify under `min_periods` always rank ahead of those that
    /// don't, so the first `qualified(kind, ..).len()` entries are exactly the
    /// qualifiers.
    pub fn portfolio(&self, kind: PortfolioKind, size: usize) -> Portfolio {
        Portfolio {
            kind,
            symbols: self
                .ranked(kind)
                .into_iter()
                .take(size)
                .map(|(s, _)| s)
                .collect(),
        }
    }

    /// Final central and peripheral portfolios.
    ///
    /// When both qualified lists reach `target_size`, every qualifier is kept.
    /// Otherwise both portfolios become the `target_size` best-ranked stocks,
    /// backfilling the short side from the ranking.
    pub fn portfolios(&self, min_periods: usize, target_size: usize) -> (Portfolio, Portfolio) {
        let central = self.qualified(PortfolioKind::Central, min_periods).len();
        let peripheral = self.qualified(PortfolioKind::Peripheral, min_periods).len();
        if central >= target_size && peripheral >= target_size {
            (
                self.portfolio(PortfolioKind::Central, central),
                self.portfolio(PortfolioKind::Peripheral, peripheral),
            )
        } else {
            (
                self.portfolio(PortfolioKind::Central, target_size),
                self.portfolio(PortfolioKind::Peripheral, target_size),
            )
        }
    }
}
