//! Single-period selection on the combined `(degree + betweenness) / 2` score.

use super::{Portfolio, PortfolioKind};
use crate::centrality::CentralityScores;
use crate::domain::Symbol;

/// Symbols ordered by combined score, highest first, ties by symbol.
pub fn rank_by_combined_score(scores: &CentralityScores) -> Vec<(Symbol, f64)> {
    let mut ranked: Vec<(Symbol, f64)> = scores
        .iter()
        .map(|(s, c)| (s.clone(), c.combined()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Top `size` as central, bottom `size` as peripheral (most peripheral
/// first). Each list holds `min(size, N)` symbols; they overlap when
/// `2 · size > N`.
pub fn select_combined(scores: &CentralityScores, size: usize) -> (Portfolio, Portfolio) {
    let ranked = rank_by_combined_score(scores);
    let k = size.min(ranked.len());

    let central = ranked.iter().take(k).map(|(s, _)| s.clone()).collect();
    let peripheral = ranked.iter().rev().take(k).map(|(s, _)| s.clone()).collect();

    (
        Portfolio {
            kind: PortfolioKind::Central,
            symbols: central,
        },
        Portfolio {
            kind: PortfolioKind::Peripheral,
            symbols: peripheral,
        },
    )
}
