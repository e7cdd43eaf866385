//! Correlation network construction.
//!
//! Price slice → log-returns → Pearson correlation → distance
//! `sqrt(2(1 − ρ))` → minimum spanning tree.

mod correlation;
mod mst;

pub use correlation::{
    correlation_distance, pearson, CorrelationMatrix, DistanceMatrix, UNDEFINED_CORRELATION,
};
pub use mst::{Edge, FilteredGraph};

use crate::domain::{PriceMatrix, Symbol};
use crate::returns::{log_returns, ReturnMatrix};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NetworkError {
    #[error("need at least 2 symbols to build a network, got {symbols}")]
    EmptyGraph { symbols: usize },

    #[error("need at least 2 return observations, got {0}")]
    InsufficientObservations(usize),

    #[error("invalid correlation matrix: {0}")]
    InvalidCorrelation(String),
}

/// Everything built for one price slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodNetwork {
    pub correlation: CorrelationMatrix,
    pub distance: DistanceMatrix,
    pub graph: FilteredGraph,
    /// Number of return rows the correlation was estimated from.
    pub observations: usize,
}

impl PeriodNetwork {
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            symbols: self.graph.node_count(),
            edges: self.graph.edge_count(),
            observations: self.observations,
            total_weight: self.graph.total_weight(),
            average_correlation: self.correlation.average_correlation(),
            clamped: self.correlation.clamped_symbols().to_vec(),
        }
    }
}

/// Compact description of a built network, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub symbols: usize,
    pub edges: usize,
    pub observations: usize,
    pub total_weight: f64,
    pub average_correlation: f64,
    pub clamped: Vec<Symbol>,
}

/// Build the filtered correlation network of a price slice.
pub fn build_network(prices: &PriceMatrix) -> Result<PeriodNetwork, NetworkError> {
    build_from_returns(&log_returns(prices))
}

/// Build the network from precomputed log-returns.
pub fn build_from_returns(returns: &ReturnMatrix) -> Result<PeriodNetwork, NetworkError> {
    if returns.n_symbols() < 2 {
        return Err(NetworkError::EmptyGraph {
            symbols: returns.n_symbols(),
        });
    }
    if returns.n_rows() < 2 {
        return Err(NetworkError::InsufficientObservations(returns.n_rows()));
    }

    let correlation = CorrelationMatrix::pearson(returns);
    if !correlation.clamped_symbols().is_empty() {
        warn!(
            symbols = ?correlation.clamped_symbols(),
            value = UNDEFINED_CORRELATION,
            "zero-variance return series, correlation clamped"
        );
    }
    let distance = DistanceMatrix::from_correlation(&correlation);
    let graph = FilteredGraph::minimum_spanning_tree(&distance);

    debug!(
        symbols = graph.node_count(),
        edges = graph.edge_count(),
        observations = returns.n_rows(),
        "built spanning tree"
    );

    Ok(PeriodNetwork {
        correlation,
        distance,
        graph,
        observations: returns.n_rows(),
    })
}
