//! Date-indexed, symbol-columned price table.
//!
//! The matrix handed to the analysis core is already clean: every cell holds a
//! positive finite price, dates are strictly ascending and symbols are unique.
//! Construction enforces that contract so nothing downstream has to re-check it.

use super::Symbol;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::ops::Range;
use thiserror::Error;

/// Shape and content violations found while building a [`PriceMatrix`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PriceMatrixError {
    #[error("column '{symbol}' has {len} rows, expected {expected}")]
    RaggedColumn {
        symbol: String,
        len: usize,
        expected: usize,
    },

    #[error("duplicate symbol '{0}'")]
    DuplicateSymbol(String),

    #[error("dates must be strictly ascending (violation at {0})")]
    UnorderedDates(NaiveDate),

    #[error("invalid price {value} for '{symbol}' on {date}")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        value: f64,
    },
}

/// Trading dates (rows) × symbols (columns) of positive prices.
///
/// Columns are kept in lexical symbol order so that every derived structure
/// (correlation matrix, spanning tree, rankings) shares one deterministic
/// vertex ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<Symbol>,
    /// Column-major: `prices[j][t]` is the price of `symbols[j]` on `dates[t]`.
    prices: Vec<Vec<f64>>,
}

impl PriceMatrix {
    /// Build a matrix from a date axis and one price column per symbol.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(Symbol, Vec<f64>)>,
    ) -> Result<Self, PriceMatrixError> {
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PriceMatrixError::UnorderedDates(w[1]));
        }

        let mut columns = columns;
        columns.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(w) = columns.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(PriceMatrixError::DuplicateSymbol(w[0].0.clone()));
        }

        for (symbol, values) in &columns {
            if values.len() != dates.len() {
                return Err(PriceMatrixError::RaggedColumn {
                    symbol: symbol.clone(),
                    len: values.len(),
                    expected: dates.len(),
                });
            }
            if let Some((t, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v <= 0.0)
            {
                return Err(PriceMatrixError::InvalidPrice {
                    symbol: symbol.clone(),
                    date: dates[t],
                    value,
                });
            }
        }

        let (symbols, prices) = columns.into_iter().unzip();
        Ok(Self {
            dates,
            symbols,
            prices,
        })
    }

    /// A matrix with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            symbols: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Symbols in lexical order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// True when there is nothing to analyze (no rows or no columns).
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.symbols.is_empty()
    }

    /// Column index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
    }

    /// Price column for a symbol.
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbol_index(symbol).map(|j| self.prices[j].as_slice())
    }

    /// Price column by index. Panics if `j` is out of bounds.
    pub fn column_at(&self, j: usize) -> &[f64] {
        &self.prices[j]
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbol_index(symbol).is_some()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Rows with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceMatrix {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end).max(lo);
        self.rows(lo..hi)
    }

    /// Rows falling in one calendar year.
    pub fn year(&self, year: i32) -> PriceMatrix {
        match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => self.between(start, end),
            _ => self.rows(0..0),
        }
    }

    /// Distinct calendar years covered, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.dates
            .iter()
            .map(|d| d.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Keep only the given symbols (unknown symbols are ignored).
    pub fn select(&self, symbols: &[Symbol]) -> PriceMatrix {
        let wanted: BTreeSet<&str> = symbols.iter().map(|s| s.as_str()).collect();
        let (symbols, prices) = self
            .symbols
            .iter()
            .zip(&self.prices)
            .filter(|(s, _)| wanted.contains(s.as_str()))
            .map(|(s, p)| (s.clone(), p.clone()))
            .unzip();
        PriceMatrix {
            dates: self.dates.clone(),
            symbols,
            prices,
        }
    }

    fn rows(&self, range: Range<usize>) -> PriceMatrix {
        PriceMatrix {
            dates: self.dates[range.clone()].to_vec(),
            symbols: self.symbols.clone(),
            prices: self
                .prices
                .iter()
                .map(|column| column[range.clone()].to_vec())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> PriceMatrix {
        PriceMatrix::new(
            vec![d("2020-12-30"), d("2020-12-31"), d("2021-01-04"), d("2021-01-05")],
            vec![
                ("MSFT".into(), vec![10.0, 11.0, 12.0, 13.0]),
                ("AAPL".into(), vec![20.0, 21.0, 22.0, 23.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn columns_are_sorted_by_symbol() {
        let m = sample();
        assert_eq!(m.symbols(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(m.column("MSFT").unwrap()[0], 10.0);
        assert_eq!(m.column_at(0)[0], 20.0);
    }

    #[test]
    fn rejects_unordered_dates() {
        let err = PriceMatrix::new(
            vec![d("2021-01-05"), d("2021-01-04")],
            vec![("A".into(), vec![1.0, 2.0])],
        )
        .unwrap_err();
        assert_eq!(err, PriceMatrixError::UnorderedDates(d("2021-01-04")));
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = PriceMatrix::new(
            vec![d("2021-01-04"), d("2021-01-05")],
            vec![("A".into(), vec![1.0, 0.0])],
        )
        .unwrap_err();
        assert!(matches!(err, PriceMatrixError::InvalidPrice { .. }));
    }

    #[test]
    fn rejects_duplicate_and_ragged_columns() {
        let dup = PriceMatrix::new(
            vec![d("2021-01-04")],
            vec![("A".into(), vec![1.0]), ("A".into(), vec![2.0])],
        );
        assert_eq!(dup.unwrap_err(), PriceMatrixError::DuplicateSymbol("A".into()));

        let ragged = PriceMatrix::new(vec![d("2021-01-04")], vec![("A".into(), vec![1.0, 2.0])]);
        assert!(matches!(ragged.unwrap_err(), PriceMatrixError::RaggedColumn { .. }));
    }

    #[test]
    fn year_slicing() {
        let m = sample();
        assert_eq!(m.years(), vec![2020, 2021]);
        let y2021 = m.year(2021);
        assert_eq!(y2021.n_rows(), 2);
        assert_eq!(y2021.column("AAPL").unwrap(), &[22.0, 23.0]);
        assert_eq!(m.year(1999).n_rows(), 0);
        assert!(m.year(1999).is_empty());
    }

    #[test]
    fn between_with_inverted_span_is_empty() {
        let m = sample();
        assert_eq!(m.between(d("2021-01-05"), d("2020-12-30")).n_rows(), 0);
    }

    #[test]
    fn select_ignores_unknown_symbols() {
        let m = sample();
        let s = m.select(&["MSFT".to_string(), "XYZ".to_string()]);
        assert_eq!(s.symbols(), &["MSFT".to_string()]);
        assert_eq!(s.n_rows(), 4);
    }
}
