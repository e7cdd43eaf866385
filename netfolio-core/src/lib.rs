//! Netfolio Core — correlation-network centrality and portfolio selection.
//!
//! This crate contains the analysis pipeline:
//! - Price matrix domain type and price-table ingestion
//! - Log and simple returns
//! - Pearson correlation, distance transform and minimum spanning tree
//! - Degree, betweenness, closeness and eigenvector centrality plus the
//!   distance-from-reference criteria
//! - Multi-period and combined-score portfolio selection
//! - Equal-weighted performance evaluation
//! - The `analyze` entry point tying it together

pub mod centrality;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod network;
pub mod performance;
pub mod pipeline;
pub mod returns;
pub mod selection;
pub mod stats;

pub use centrality::{CancellationToken, Centrality, CentralityConfig, CentralityScores};
pub use domain::{PriceMatrix, PriceMatrixError, Symbol};
pub use network::{build_network, FilteredGraph, NetworkError, PeriodNetwork};
pub use performance::PerformanceStats;
pub use pipeline::{
    analyze, analyze_with, Analysis, AnalysisConfig, AnalysisContext, AnalysisError,
    AnalysisReport, NetworkSource,
};
pub use selection::{Portfolio, PortfolioKind, SelectionStrategy};
