//! Near/far ranking from the distance-from-reference criteria.
//!
//! Diagnostic only; it never feeds portfolio selection.

use crate::centrality::DistanceCriteria;
use crate::domain::Symbol;
use serde::Serialize;
use std::collections::BTreeMap;

/// A stock this many hops or fewer from a reference counts as near.
pub const NEAR_HOPS: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NearFar {
    pub near: usize,
    pub far: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistanceRanking {
    /// Criteria observations folded in (three per period).
    observations: usize,
    counts: BTreeMap<Symbol, NearFar>,
}

impl DistanceRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in all three criteria of one period. Unreachable stocks are far.
    pub fn record(&mut self, criteria: &DistanceCriteria) {
        for (_, reference) in criteria.iter() {
            self.observations += 1;
            for (symbol, hops) in &reference.hops {
                let entry = self.counts.entry(symbol.clone()).or_default();
                match hops {
                    Some(h) if *h <= NEAR_HOPS => entry.near += 1,
                    _ => entry.far += 1,
                }
            }
        }
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn get(&self, symbol: &str) -> Option<&NearFar> {
        self.counts.get(symbol)
    }

    /// Up to `k` stocks most often near a reference, ties by symbol.
    pub fn nearest(&self, k: usize) -> Vec<Symbol> {
        self.ordered(k, |c| c.near)
    }

    /// Up to `k` stocks most often far from a reference, ties by symbol.
    pub fn farthest(&self, k: usize) -> Vec<Symbol> {
        self.ordered(k, |c| c.far)
    }

    fn ordered(&self, k: usize, key: impl Fn(&NearFar) -> usize) -> Vec<Symbol> {
        let mut all: Vec<(&Symbol, usize)> = self.counts.iter().map(|(s, c)| (s, key(c))).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1));
        all.into_iter().take(k).map(|(s, _)| s.clone()).collect()
    }
}
