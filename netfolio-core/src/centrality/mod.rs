//! Centrality measures on a filtered graph.
//!
//! Degree, betweenness and closeness are always computed. Eigenvector
//! centrality is optional and may fail to converge; failure drops that one
//! measure and keeps the rest.

mod distance;
mod eigenvector;

pub use distance::{distance_criteria, DistanceCriteria, ReferenceDistances};
pub use eigenvector::{eigenvector_centrality, CancellationToken, EigenvectorError};

use crate::domain::Symbol;
use crate::network::FilteredGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

/// Centrality measures of one vertex. Degree, betweenness and closeness lie in
/// [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centrality {
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvector: Option<f64>,
}

impl Centrality {
    /// `(degree + betweenness) / 2`.
    pub fn combined(&self) -> f64 {
        (self.degree + self.betweenness) / 2.0
    }
}

/// Settings for [`compute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityConfig {
    #[serde(default = "default_true")]
    pub eigenvector: bool,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_true() -> bool {
    true
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_iterations() -> usize {
    1000
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            eigenvector: default_true(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// Per-symbol centrality, in lexical symbol order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralityScores {
    scores: BTreeMap<Symbol, Centrality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eigenvector_error: Option<EigenvectorError>,
}

impl CentralityScores {
    pub fn get(&self, symbol: &str) -> Option<&Centrality> {
        self.scores.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Centrality)> {
        self.scores.iter()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn degrees(&self) -> Vec<f64> {
        self.scores.values().map(|c| c.degree).collect()
    }

    pub fn betweenness(&self) -> Vec<f64> {
        self.scores.values().map(|c| c.betweenness).collect()
    }

    /// Why eigenvector centrality is missing, if it was requested and failed.
    pub fn eigenvector_error(&self) -> Option<&EigenvectorError> {
        self.eigenvector_error.as_ref()
    }
}

impl FromIterator<(Symbol, Centrality)> for CentralityScores {
    fn from_iter<I: IntoIterator<Item = (Symbol, Centrality)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
            eigenvector_error: None,
        }
    }
}

pub fn compute(graph: &FilteredGraph, config: &CentralityConfig) -> CentralityScores {
    compute_with_cancel(graph, config, &CancellationToken::new())
}

pub fn compute_with_cancel(
    graph: &FilteredGraph,
    config: &CentralityConfig,
    cancel: &CancellationToken,
) -> CentralityScores {
    let degree = degree_centrality(graph);
    let betweenness = betweenness_centrality(graph);
    let closeness = closeness_centrality(graph);

    let (eigen, eigenvector_error) = if config.eigenvector {
        match eigenvector_centrality(graph, config.tolerance, config.max_iterations, cancel) {
            Ok(x) => (Some(x), None),
            Err(e) => {
                warn!(error = %e, vertices = graph.node_count(), "eigenvector centrality omitted");
                (None, Some(e))
            }
        }
    } else {
        (None, None)
    };

    let scores = graph
        .symbols()
        .iter()
        .enumerate()
        .map(|(v, symbol)| {
            (
                symbol.clone(),
                Centrality {
                    degree: degree[v],
                    betweenness: betweenness[v],
                    closeness: closeness[v],
                    eigenvector: eigen.as_ref().map(|x| x[v]),
                },
            )
        })
        .collect();

    CentralityScores {
        scores,
        eigenvector_error,
    }
}

/// `degree / (N − 1)`; 0 for a single vertex.
pub fn degree_centrality(graph: &FilteredGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n < 2 {
        return vec![0.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|v| graph.degree(v) as f64 * scale).collect()
}

/// Brandes betweenness on hop counts, normalized to the number of vertex pairs
/// not involving the vertex. All zeros for `N ≤ 2`.
pub fn betweenness_centrality(graph: &FilteredGraph) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    if n <= 2 {
        return centrality;
    }

    let mut stack = Vec::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1_i64; n];
    let mut delta = vec![0.0_f64; n];

    for s in 0..n {
        stack.clear();
        for p in &mut predecessors {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in graph.neighbors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    // each unordered pair was accumulated from both endpoints
    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    for c in &mut centrality {
        *c *= scale;
    }
    centrality
}

/// Closeness on hop counts with Wasserman–Faust scaling:
/// `(r / Σd) · (r / (N − 1))` where `r` counts reachable vertices.
pub fn closeness_centrality(graph: &FilteredGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|v| {
            let (reachable, total) = graph
                .hop_distances(v)
                .iter()
                .flatten()
                .filter(|&&d| d > 0)
                .fold((0usize, 0usize), |(r, t), &d| (r + 1, t + d));
            if total == 0 {
                0.0
            } else {
                let r = reachable as f64;
                (r / total as f64) * (r / (n - 1) as f64)
            }
        })
        .collect()
}
