//! Eigenvector centrality by power iteration.

use crate::network::FilteredGraph;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EigenvectorError {
    #[error("power iteration did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("eigenvector computation cancelled")]
    Cancelled,

    #[error("graph has no vertices")]
    EmptyGraph,
}

impl serde::Serialize for EigenvectorError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Cooperative cancellation flag shared between a caller and long-running
/// numeric work. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Dominant eigenvector of the adjacency operator, unit L2 norm.
///
/// Iterates on `A + I`, which has the same eigenvectors as `A` but a strictly
/// dominant eigenvalue on bipartite graphs (every tree is bipartite, and plain
/// power iteration on `A` oscillates there). Converges when the L1 change
/// between successive iterates drops below `tolerance × N`.
pub fn eigenvector_centrality(
    graph: &FilteredGraph,
    tolerance: f64,
    max_iterations: usize,
    cancel: &CancellationToken,
) -> Result<Vec<f64>, EigenvectorError> {
    let n = graph.node_count();
    if n == 0 {
        return Err(EigenvectorError::EmptyGraph);
    }

    let mut x = vec![1.0 / (n as f64).sqrt(); n];
    let threshold = tolerance * n as f64;

    for _ in 0..max_iterations {
        if cancel.is_cancelled() {
            return Err(EigenvectorError::Cancelled);
        }

        let mut next: Vec<f64> = (0..n)
            .map(|v| x[v] + graph.neighbors(v).iter().map(|&w| x[w]).sum::<f64>())
            .collect();

        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(EigenvectorError::NotConverged {
                iterations: max_iterations,
            });
        }
        for v in &mut next {
            *v /= norm;
        }

        let change: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if change < threshold {
            return Ok(x);
        }
    }

    Err(EigenvectorError::NotConverged {
        iterations: max_iterations,
    })
}
