//! Pearson correlation and the correlation → distance transform.

use super::NetworkError;
use crate::domain::Symbol;
use crate::returns::ReturnMatrix;
use serde::Serialize;

/// Value substituted for any correlation that is undefined.
///
/// A return series with zero variance has no defined Pearson correlation with
/// anything. Such pairs are treated as uncorrelated before the distance
/// transform so no NaN ever reaches the spanning tree.
pub const UNDEFINED_CORRELATION: f64 = 0.0;

/// Symmetric symbol × symbol correlation matrix with unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    symbols: Vec<Symbol>,
    /// Row-major, `size × size`.
    values: Vec<Vec<f64>>,
    /// Symbols whose correlations were undefined and replaced by
    /// [`UNDEFINED_CORRELATION`].
    clamped: Vec<Symbol>,
}

impl CorrelationMatrix {
    /// Pairwise Pearson correlation of every return column.
    pub fn pearson(returns: &ReturnMatrix) -> Self {
        let n = returns.n_symbols();
        let mut values = vec![vec![UNDEFINED_CORRELATION; n]; n];
        let mut degenerate = vec![false; n];

        for (j, column) in returns.columns().iter().enumerate() {
            degenerate[j] = column_variance(column).map_or(true, |v| v <= 0.0);
        }

        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = if degenerate[i] || degenerate[j] {
                    None
                } else {
                    pearson(returns.column_at(i), returns.column_at(j))
                };
                let r = r.unwrap_or(UNDEFINED_CORRELATION);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        let clamped = returns
            .symbols()
            .iter()
            .zip(&degenerate)
            .filter(|(_, d)| **d)
            .map(|(s, _)| s.clone())
            .collect();

        Self {
            symbols: returns.symbols().to_vec(),
            values,
            clamped,
        }
    }

    /// Build from an explicit square matrix.
    ///
    /// Symbols must be unique and lexically sorted. The upper triangle is
    /// authoritative; non-finite entries become [`UNDEFINED_CORRELATION`] and
    /// everything is clamped into [−1, 1].
    pub fn from_values(symbols: Vec<Symbol>, values: Vec<Vec<f64>>) -> Result<Self, NetworkError> {
        let n = symbols.len();
        if symbols.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NetworkError::InvalidCorrelation(
                "symbols must be unique and sorted".into(),
            ));
        }
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            return Err(NetworkError::InvalidCorrelation(format!(
                "expected a {n}x{n} matrix"
            )));
        }

        let mut sanitized = vec![vec![UNDEFINED_CORRELATION; n]; n];
        for i in 0..n {
            sanitized[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = sanitize(values[i][j]);
                sanitized[i][j] = r;
                sanitized[j][i] = r;
            }
        }

        Ok(Self {
            symbols,
            values: sanitized,
            clamped: Vec::new(),
        })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Correlation by index. Panics if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Correlation by symbol pair.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values[i][j])
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
    }

    pub fn clamped_symbols(&self) -> &[Symbol] {
        &self.clamped
    }

    /// Mean off-diagonal correlation; 0.0 below two symbols.
    pub fn average_correlation(&self) -> f64 {
        let n = self.size();
        if n < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                sum += self.values[i][j];
            }
        }
        sum / (n * (n - 1) / 2) as f64
    }
}

/// Distances `sqrt(2 · (1 − ρ))`: 0 for perfectly correlated, 2 for perfectly
/// anti-correlated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    symbols: Vec<Symbol>,
    values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn from_correlation(correlation: &CorrelationMatrix) -> Self {
        let values = correlation
            .values
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, &rho)| if i == j { 0.0 } else { correlation_distance(rho) })
                    .collect::<Vec<f64>>()
            })
            .collect();
        Self {
            symbols: correlation.symbols.clone(),
            values,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// `sqrt(2 · (1 − ρ))` with the radicand floored at zero.
pub fn correlation_distance(rho: f64) -> f64 {
    (2.0 * (1.0 - sanitize(rho))).max(0.0).sqrt()
}

fn sanitize(rho: f64) -> f64 {
    if rho.is_finite() {
        rho.clamp(-1.0, 1.0)
    } else {
        UNDEFINED_CORRELATION
    }
}

fn column_variance(column: &[f64]) -> Option<f64> {
    if column.len() < 2 {
        return None;
    }
    let n = column.len() as f64;
    let mean = column.iter().sum::<f64>() / n;
    let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    var.is_finite().then_some(var)
}

/// Pearson correlation of two equal-length series, `None` when undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = cov / (var_x * var_y).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceMatrix;
    use crate::returns::log_returns;
    use chrono::NaiveDate;

    fn prices(columns: Vec<(&str, Vec<f64>)>) -> PriceMatrix {
        let rows = columns[0].1.len();
        let base = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        PriceMatrix::new(
            (0..rows)
                .map(|i| base + chrono::Duration::days(i as i64))
                .collect(),
            columns
                .into_iter()
                .map(|(s, v)| (s.to_string(), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn pearson_known_values() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[5.0; 4]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn constant_column_is_clamped_to_undefined_value() {
        let m = prices(vec![
            ("A", vec![10.0, 11.0, 10.5, 12.0, 11.0]),
            ("B", vec![20.0, 21.5, 21.0, 23.0, 22.5]),
            ("FLAT", vec![7.0; 5]),
        ]);
        let c = CorrelationMatrix::pearson(&log_returns(&m));

        assert_eq!(c.clamped_symbols(), &["FLAT".to_string()]);
        assert_eq!(c.between("FLAT", "A"), Some(UNDEFINED_CORRELATION));
        assert_eq!(c.between("B", "FLAT"), Some(UNDEFINED_CORRELATION));
        assert_eq!(c.between("FLAT", "FLAT"), Some(1.0));
        assert!(c.between("A", "B").unwrap() > 0.5);

        let d = DistanceMatrix::from_correlation(&c);
        for i in 0..d.size() {
            for j in 0..d.size() {
                assert!(d.get(i, j).is_finite());
            }
        }
        assert!((d.get(0, 2) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let m = prices(vec![
            ("A", vec![10.0, 11.0, 10.5, 12.0, 11.0, 11.7]),
            ("B", vec![20.0, 19.5, 21.0, 23.0, 22.5, 22.0]),
            ("C", vec![5.0, 5.1, 5.3, 5.2, 5.6, 5.5]),
        ]);
        let c = CorrelationMatrix::pearson(&log_returns(&m));
        for i in 0..3 {
            assert_eq!(c.get(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(c.get(i, j), c.get(j, i));
                assert!((-1.0..=1.0).contains(&c.get(i, j)));
            }
        }
    }

    #[test]
    fn distance_transform_range() {
        assert_eq!(correlation_distance(1.0), 0.0);
        assert!((correlation_distance(-1.0) - 2.0).abs() < 1e-12);
        assert!((correlation_distance(0.0) - 2.0_f64.sqrt()).abs() < 1e-12);
        // rounding drift above 1 must not produce NaN
        assert_eq!(correlation_distance(1.0 + 1e-15), 0.0);
        assert!((correlation_distance(f64::NAN) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn from_values_validates_shape_and_order() {
        let unsorted = CorrelationMatrix::from_values(
            vec!["B".into(), "A".into()],
            vec![vec![1.0, 0.5], vec![0.5, 1.0]],
        );
        assert!(unsorted.is_err());

        let ragged = CorrelationMatrix::from_values(vec!["A".into(), "B".into()], vec![vec![1.0]]);
        assert!(ragged.is_err());

        let ok = CorrelationMatrix::from_values(
            vec!["A".into(), "B".into()],
            vec![vec![1.0, f64::NAN], vec![f64::NAN, 1.0]],
        )
        .unwrap();
        assert_eq!(ok.get(0, 1), UNDEFINED_CORRELATION);
    }

    #[test]
    fn average_correlation() {
        let c = CorrelationMatrix::from_values(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![1.0, 0.9, 0.1],
                vec![0.9, 1.0, 0.2],
                vec![0.1, 0.2, 1.0],
            ],
        )
        .unwrap();
        assert!((c.average_correlation() - 0.4).abs() < 1e-12);
    }
}
