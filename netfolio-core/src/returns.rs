//! Returns engine: log-returns for network construction, simple returns for
//! portfolio performance.
//!
//! Sign convention: `ln(P[t]) − ln(P[t−1])` and `P[t] / P[t−1] − 1`, i.e. a
//! rising price gives a positive return under both transforms. The leading row
//! of either transform has no lag and is dropped, so a matrix with `n` price
//! rows yields `n − 1` return rows. Fewer than two price rows yield an empty
//! return matrix.

use crate::domain::{PriceMatrix, Symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which transform produced a [`ReturnMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    Log,
    Simple,
}

/// Per-symbol return series sharing one date axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    kind: ReturnKind,
    /// Date of the later price of each return.
    dates: Vec<NaiveDate>,
    symbols: Vec<Symbol>,
    columns: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    pub fn kind(&self) -> ReturnKind {
        self.kind
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
            .map(|j| self.columns[j].as_slice())
    }

    pub fn column_at(&self, j: usize) -> &[f64] {
        &self.columns[j]
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }
}

/// Log-returns, used for correlation.
pub fn log_returns(prices: &PriceMatrix) -> ReturnMatrix {
    transform(prices, ReturnKind::Log, |prev, cur| cur.ln() - prev.ln())
}

/// Simple (percentage) returns, used for portfolio performance.
pub fn pct_returns(prices: &PriceMatrix) -> ReturnMatrix {
    transform(prices, ReturnKind::Simple, |prev, cur| cur / prev - 1.0)
}

fn transform(prices: &PriceMatrix, kind: ReturnKind, f: impl Fn(f64, f64) -> f64) -> ReturnMatrix {
    let symbols = prices.symbols().to_vec();
    if prices.n_rows() < 2 {
        return ReturnMatrix {
            kind,
            dates: Vec::new(),
            columns: vec![Vec::new(); symbols.len()],
            symbols,
        };
    }

    let columns: Vec<Vec<f64>> = (0..prices.n_symbols())
        .map(|j| {
            prices
                .column_at(j)
                .windows(2)
                .map(|w| f(w[0], w[1]))
                .collect::<Vec<f64>>()
        })
        .collect();

    ReturnMatrix {
        kind,
        dates: prices.dates()[1..].to_vec(),
        symbols,
        columns,
    }
}
