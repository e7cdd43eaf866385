//! Distance-from-reference criteria.
//!
//! Each criterion picks one reference vertex of the spanning tree and records
//! every vertex's hop count to it. Ties on the selection score go to the first
//! symbol in lexical order.

use crate::domain::Symbol;
use crate::network::{CorrelationMatrix, FilteredGraph};
use serde::Serialize;
use std::collections::BTreeMap;

/// A reference vertex and every symbol's hop distance to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceDistances {
    pub reference: Symbol,
    /// `None` when the symbol cannot reach the reference.
    pub hops: BTreeMap<Symbol, Option<usize>>,
}

impl ReferenceDistances {
    pub fn hops_to(&self, symbol: &str) -> Option<usize> {
        self.hops.get(symbol).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceCriteria {
    /// Reference = vertex of largest degree.
    pub degree: ReferenceDistances,
    /// Reference = vertex with the largest summed correlation to its tree
    /// neighbours.
    pub correlation: ReferenceDistances,
    /// Reference = vertex with the smallest mean hop distance to all others.
    pub distance: ReferenceDistances,
}

impl DistanceCriteria {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ReferenceDistances)> {
        [
            ("degree", &self.degree),
            ("correlation", &self.correlation),
            ("distance", &self.distance),
        ]
        .into_iter()
    }
}

/// Compute the three criteria. `None` for an empty graph.
///
/// The correlation criterion looks symbols up by name, so `correlation` may
/// cover a superset of the graph's symbols; pairs it lacks contribute 0.
pub fn distance_criteria(
    graph: &FilteredGraph,
    correlation: &CorrelationMatrix,
) -> Option<DistanceCriteria> {
    let n = graph.node_count();
    if n == 0 {
        return None;
    }
    let symbols = graph.symbols();
    let all_hops: Vec<Vec<Option<usize>>> = (0..n).map(|v| graph.hop_distances(v)).collect();

    let degree_ref = argmax((0..n).map(|v| graph.degree(v) as f64))?;

    let correlation_ref = argmax((0..n).map(|v| {
        graph
            .neighbors(v)
            .iter()
            .map(|&w| correlation.between(&symbols[v], &symbols[w]).unwrap_or(0.0))
            .sum::<f64>()
    }))?;

    let distance_ref = argmax((0..n).map(|v| -mean_hops(&all_hops[v], v)))?;

    let reference = |r: usize| ReferenceDistances {
        reference: symbols[r].clone(),
        hops: symbols
            .iter()
            .cloned()
            .zip(all_hops[r].iter().copied())
            .collect(),
    };

    Some(DistanceCriteria {
        degree: reference(degree_ref),
        correlation: reference(correlation_ref),
        distance: reference(distance_ref),
    })
}

/// Mean hop distance to every other vertex; unreachable vertices count as
/// `n` hops so a disconnected vertex never wins.
fn mean_hops(hops: &[Option<usize>], source: usize) -> f64 {
    let n = hops.len();
    if n < 2 {
        return 0.0;
    }
    let total: usize = hops
        .iter()
        .enumerate()
        .filter(|(v, _)| *v != source)
        .map(|(_, h)| h.unwrap_or(n))
        .sum();
    total as f64 / (n - 1) as f64
}

/// Index of the first maximum.
fn argmax(scores: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in scores.enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Edge;

    fn syms(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// A - B - C - D - E with F hanging off D.
    fn tree() -> (FilteredGraph, CorrelationMatrix) {
        let symbols = syms(&["A", "B", "C", "D", "E", "F"]);
        let edge = |a, b| Edge { a, b, weight: 1.0 };
        let graph = FilteredGraph::from_edges(
            symbols.clone(),
            vec![edge(0, 1), edge(1, 2), edge(2, 3), edge(3, 4), edge(3, 5)],
        );
        let mut values = vec![vec![0.2; 6]; 6];
        for (i, row) in values.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        values[0][1] = 0.95;
        values[1][0] = 0.95;
        let corr = CorrelationMatrix::from_values(symbols, values).unwrap();
        (graph, corr)
    }

    #[test]
    fn degree_reference_is_hub() {
        let (g, c) = tree();
        let criteria = distance_criteria(&g, &c).unwrap();
        assert_eq!(criteria.degree.reference, "D");
        assert_eq!(criteria.degree.hops_to("A"), Some(3));
        assert_eq!(criteria.degree.hops_to("F"), Some(1));
        assert_eq!(criteria.degree.hops_to("D"), Some(0));
    }

    #[test]
    fn correlation_reference_uses_neighbour_sum() {
        let (g, c) = tree();
        let criteria = distance_criteria(&g, &c).unwrap();
        // B: 0.95 + 0.2 = 1.15; D: 3 × 0.2 = 0.6
        assert_eq!(criteria.correlation.reference, "B");
        assert_eq!(criteria.correlation.hops_to("E"), Some(3));
    }

    #[test]
    fn distance_reference_minimises_mean_hops() {
        let (g, c) = tree();
        let criteria = distance_criteria(&g, &c).unwrap();
        // C: 2+1+1+2+2 = 8, D: 3+2+1+1+1 = 8 → tie, first in order wins
        assert_eq!(criteria.distance.reference, "C");
        let names: Vec<_> = criteria.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["degree", "correlation", "distance"]);
    }

    #[test]
    fn ties_resolve_to_first_symbol() {
        let symbols = syms(&["A", "B"]);
        let g = FilteredGraph::from_edges(symbols.clone(), vec![Edge { a: 0, b: 1, weight: 0.3 }]);
        let c = CorrelationMatrix::from_values(symbols, vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let criteria = distance_criteria(&g, &c).unwrap();
        assert_eq!(criteria.degree.reference, "A");
        assert_eq!(criteria.correlation.reference, "A");
        assert_eq!(criteria.distance.reference, "A");
    }

    #[test]
    fn empty_graph_has_no_criteria() {
        let g = FilteredGraph::from_edges(Vec::new(), Vec::new());
        let c = CorrelationMatrix::from_values(Vec::new(), Vec::new()).unwrap();
        assert!(distance_criteria(&g, &c).is_none());
    }
}
