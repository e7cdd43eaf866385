//! Deterministic synthetic price tables.
//!
//! A one-market, several-sector factor model: each stock's daily return is
//! `beta · market + sector + noise`, so stocks of one sector correlate more
//! with each other than with the rest and the spanning tree has visible
//! structure. Tables are clearly fake; data loaded this way is tagged
//! synthetic by the loader.

use chrono::{Datelike, NaiveDate, Weekday};
use netfolio_core::domain::{PriceMatrix, PriceMatrixError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Parameters of a synthetic market.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticMarket {
    pub symbols: usize,
    pub sectors: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Seed label; equal labels give equal tables.
    pub seed: String,
}

impl SyntheticMarket {
    pub fn new(symbols: usize, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbols,
            sectors: 4,
            start,
            end,
            seed: "netfolio".to_string(),
        }
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn with_sectors(mut self, sectors: usize) -> Self {
        self.sectors = sectors.max(1);
        self
    }

    /// Symbol names `SYN000`, `SYN001`, ...
    pub fn symbol_names(&self) -> Vec<String> {
        (0..self.symbols).map(|j| format!("SYN{j:03}")).collect()
    }

    pub fn generate(&self) -> Result<PriceMatrix, PriceMatrixError> {
        // Deterministic seed from the label
        let seed: [u8; 32] = *blake3::hash(self.seed.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let dates = weekdays(self.start, self.end);
        let sectors = self.sectors.max(1);
        let betas: Vec<f64> = (0..self.symbols).map(|_| rng.gen_range(0.4..1.6)).collect();
        let sector_weight: Vec<f64> = (0..self.symbols).map(|_| rng.gen_range(0.5..1.5)).collect();

        let mut level: Vec<f64> = (0..self.symbols).map(|_| rng.gen_range(20.0..200.0)).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(dates.len()); self.symbols];
        let mut sector_moves = vec![0.0; sectors];

        for _ in &dates {
            let market: f64 = rng.gen_range(-0.015..0.015);
            for m in sector_moves.iter_mut() {
                *m = rng.gen_range(-0.01..0.01);
            }
            for j in 0..self.symbols {
                let noise: f64 = rng.gen_range(-0.012..0.012);
                let r = betas[j] * market + sector_weight[j] * sector_moves[j % sectors] + noise;
                level[j] *= 1.0 + r;
                columns[j].push(level[j]);
            }
        }

        PriceMatrix::new(dates, self.symbol_names().into_iter().zip(columns).collect())
    }
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Write a price matrix as a wide CSV: `Date,<symbol>...`.
pub fn write_price_csv(prices: &PriceMatrix, path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["Date".to_string()];
    header.extend(prices.symbols().iter().cloned());
    writer.write_record(&header)?;

    for (i, date) in prices.dates().iter().enumerate() {
        let mut row = Vec::with_capacity(prices.n_symbols() + 1);
        row.push(date.format("%Y-%m-%d").to_string());
        for j in 0..prices.n_symbols() {
            row.push(format!("{:.6}", prices.column_at(j)[i]));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfolio_core::data::read_price_table;

    fn market() -> SyntheticMarket {
        SyntheticMarket::new(
            12,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        )
    }

    #[test]
    fn same_seed_same_table() {
        let a = market().generate().unwrap();
        let b = market().generate().unwrap();
        assert_eq!(a, b);

        let c = market().with_seed("other").generate().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn weekdays_only_and_positive() {
        let prices = market().generate().unwrap();
        assert_eq!(prices.n_symbols(), 12);
        assert!(prices
            .dates()
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
        for j in 0..prices.n_symbols() {
            assert!(prices.column_at(j).iter().all(|p| *p > 0.0));
        }
        assert_eq!(prices.years(), vec![2020, 2021]);
    }

    #[test]
    fn csv_is_readable_by_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synthetic.csv");
        let prices = market().with_sectors(3).generate().unwrap();
        write_price_csv(&prices, &path).unwrap();

        let table = read_price_table(&path).unwrap();
        assert!(table.dropped.is_empty());
        assert_eq!(table.prices.symbols(), prices.symbols());
        assert_eq!(table.prices.dates(), prices.dates());
    }
}
