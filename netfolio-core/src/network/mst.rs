//! Minimum spanning tree filtering of the complete distance graph.
//!
//! Kruskal with union-find. Candidate edges are ordered by
//! `(weight, i, j)` with `i < j` indices in lexical symbol order, so equal
//! weights always resolve the same way and repeated runs on the same data
//! produce the same tree.

use super::correlation::DistanceMatrix;
use crate::domain::Symbol;
use serde::Serialize;
use std::collections::VecDeque;

/// An undirected weighted edge between two vertex indices (`a < b`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

/// Undirected weighted graph over a fixed, sorted symbol set.
///
/// Built by [`FilteredGraph::minimum_spanning_tree`] it holds exactly
/// `N − 1` edges and is connected and acyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredGraph {
    symbols: Vec<Symbol>,
    edges: Vec<Edge>,
    /// Sorted neighbour indices per vertex.
    adjacency: Vec<Vec<usize>>,
}

impl FilteredGraph {
    /// Minimum spanning tree of the complete graph weighted by `distance`.
    pub fn minimum_spanning_tree(distance: &DistanceMatrix) -> Self {
        let n = distance.size();
        let mut candidates: Vec<Edge> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for a in 0..n {
            for b in (a + 1)..n {
                candidates.push(Edge {
                    a,
                    b,
                    weight: distance.get(a, b),
                });
            }
        }
        candidates.sort_by(|x, y| {
            x.weight
                .total_cmp(&y.weight)
                .then(x.a.cmp(&y.a))
                .then(x.b.cmp(&y.b))
        });

        let mut forest = UnionFind::new(n);
        let mut tree = Vec::with_capacity(n.saturating_sub(1));
        for edge in candidates {
            if tree.len() + 1 >= n {
                break;
            }
            if forest.union(edge.a, edge.b) {
                tree.push(edge);
            }
        }

        Self::from_edges(distance.symbols().to_vec(), tree)
    }

    /// Graph from an explicit edge list. Edges referencing unknown vertices or
    /// forming self-loops are ignored.
    pub fn from_edges(symbols: Vec<Symbol>, edges: Vec<Edge>) -> Self {
        let n = symbols.len();
        let mut adjacency = vec![Vec::new(); n];
        let mut kept = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.a >= n || edge.b >= n || edge.a == edge.b {
                continue;
            }
            let (a, b) = (edge.a.min(edge.b), edge.a.max(edge.b));
            adjacency[a].push(b);
            adjacency[b].push(a);
            kept.push(Edge {
                a,
                b,
                weight: edge.weight,
            });
        }
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
        }
        Self {
            symbols,
            edges: kept,
            adjacency,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn node_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjacency[v]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
    }

    /// True when there is an edge between the two symbols.
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.adjacency[i].binary_search(&j).is_ok(),
            _ => false,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Hop counts from `source` by BFS; `None` for unreachable vertices.
    pub fn hop_distances(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.node_count()];
        if source >= self.node_count() {
            return dist;
        }
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let next = dist[v].map_or(0, |d| d + 1);
            for &w in &self.adjacency[v] {
                if dist[w].is_none() {
                    dist[w] = Some(next);
                    queue.push_back(w);
                }
            }
        }
        dist
    }

    /// True when every vertex is reachable from vertex 0 (vacuously true for
    /// an empty graph).
    pub fn is_connected(&self) -> bool {
        if self.node_count() == 0 {
            return true;
        }
        self.hop_distances(0).iter().all(Option::is_some)
    }
}

/// Disjoint-set forest with path halving and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `x` and `y`; false when already in the same set.
    fn union(&mut self, x: usize, y: usize) -> bool {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx == ry {
            return false;
        }
        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] = self.rank[rx].saturating_add(1);
            }
        }
        true
    }
}
