//! Equal-weighted portfolio performance — pure functions over a price slice.
//!
//! Returns are simple daily returns; nothing is annualized.

use crate::domain::{PriceMatrix, Symbol};
use crate::returns::pct_returns;
use crate::stats::{mean, std_dev};
use serde::{Deserialize, Serialize};

/// Performance of one portfolio over one price slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub average_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

impl PerformanceStats {
    /// The neutral report for an empty or unresolvable portfolio.
    pub const ZERO: PerformanceStats = PerformanceStats {
        average_return: 0.0,
        volatility: 0.0,
        sharpe_ratio: 0.0,
    };

    /// Statistics of a daily return series.
    pub fn from_returns(returns: &[f64]) -> Self {
        let average_return = mean(returns);
        let volatility = std_dev(returns);
        Self {
            average_return,
            volatility,
            sharpe_ratio: sharpe_ratio(average_return, volatility),
        }
    }
}

/// Evaluate an equal-weighted portfolio over `prices`.
///
/// An empty portfolio, or one naming a symbol absent from `prices`, yields
/// [`PerformanceStats::ZERO`].
pub fn evaluate(symbols: &[Symbol], prices: &PriceMatrix) -> PerformanceStats {
    match portfolio_returns(symbols, prices) {
        Some(returns) => PerformanceStats::from_returns(&returns),
        None => PerformanceStats::ZERO,
    }
}

/// Daily equal-weighted returns: per row, the mean of the members' simple
/// returns. `None` when the portfolio is empty or any member is missing.
pub fn portfolio_returns(symbols: &[Symbol], prices: &PriceMatrix) -> Option<Vec<f64>> {
    if symbols.is_empty() || !symbols.iter().all(|s| prices.contains(s)) {
        return None;
    }
    let returns = pct_returns(&prices.select(symbols));
    let columns = returns.columns();
    let weight = 1.0 / columns.len() as f64;

    Some(
        (0..returns.n_rows())
            .map(|t| columns.iter().map(|c| c[t]).sum::<f64>() * weight)
            .collect(),
    )
}

// ─── Ratios ─────────────────────────────────────────────────────────

/// `average / volatility`; 0 when volatility is zero or not finite.
pub fn sharpe_ratio(average_return: f64, volatility: f64) -> f64 {
    if volatility == 0.0 || !volatility.is_finite() {
        return 0.0;
    }
    average_return / volatility
}
