//! Content fingerprints.
//!
//! - `DatasetHash`: BLAKE3 over a price matrix (symbols, dates, price bits).
//!   Two slices with identical content share a hash regardless of where they
//!   came from, which is what the network cache keys on.
//! - `ConfigHash`: BLAKE3 over the canonical JSON of an analysis config.

use crate::domain::PriceMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content hash of a price matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of a serialized configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic BLAKE3 hash over all cells of a price matrix.
///
/// Columns are already in lexical order, so the hash is independent of the
/// order the source table listed them in.
pub fn dataset_hash(prices: &PriceMatrix) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(prices.n_symbols() as u64).to_le_bytes());
    hasher.update(&(prices.n_rows() as u64).to_le_bytes());
    for date in prices.dates() {
        hasher.update(date.to_string().as_bytes());
    }
    for (j, symbol) in prices.symbols().iter().enumerate() {
        hasher.update(symbol.as_bytes());
        hasher.update(&[0]);
        for price in prices.column_at(j) {
            hasher.update(&price.to_le_bytes());
        }
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn matrix(order: &[(&str, f64)]) -> PriceMatrix {
        let d = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        PriceMatrix::new(
            vec![d, d.succ_opt().unwrap()],
            order
                .iter()
                .map(|&(s, p)| (s.to_string(), vec![p, p * 1.01]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn hash_is_order_independent() {
        let a = matrix(&[("AAA", 10.0), ("BBB", 20.0)]);
        let b = matrix(&[("BBB", 20.0), ("AAA", 10.0)]);
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn hash_changes_with_content() {
        let a = matrix(&[("AAA", 10.0), ("BBB", 20.0)]);
        let b = matrix(&[("AAA", 10.0), ("BBB", 20.5)]);
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
        assert_eq!(dataset_hash(&a).short().len(), 12);
        assert_eq!(dataset_hash(&a).to_string().len(), 64);
    }

    #[test]
    fn config_hash_is_deterministic() {
        assert_eq!(ConfigHash::from_bytes(b"x"), ConfigHash::from_bytes(b"x"));
        assert_ne!(ConfigHash::from_bytes(b"x"), ConfigHash::from_bytes(b"y"));
    }
}
