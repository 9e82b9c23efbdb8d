//! Search: greedy descent through the upper layers, then a best-first beam
//! over layer 0.

use super::layer::NodeId;
use super::ordered_float::Candidate;
use super::LayeredGraph;
use crate::distance::squared_euclidean;
use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

impl LayeredGraph {
    /// Returns up to `k` `(position, squared distance)` pairs, nearest first.
    ///
    /// `ef` is the layer-0 beam width; values below `k` are raised to `k`.
    /// Equal distances are ordered by position, lower first. Results are
    /// approximate: lowering `ef` trades recall for latency.
    ///
    /// # Errors
    ///
    /// - `EmptyIndex` if the graph holds no nodes.
    /// - `InvalidArgument` if `k == 0` or `ef == 0`.
    /// - `DimensionMismatch` if `query` has the wrong length.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<(NodeId, f32)>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if ef == 0 {
            return Err(Error::InvalidArgument("ef must be at least 1".to_string()));
        }
        if query.len() != self.params.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.params.dimension,
                actual: query.len(),
            });
        }
        let Some(entry) = self.entry_point else {
            return Err(Error::EmptyIndex);
        };

        let mut current = entry;
        for layer_idx in (1..=self.max_layer).rev() {
            current = self.greedy_closest(query, current, layer_idx);
        }

        let mut results = self.search_layer(query, &[current], ef.max(k), 0);
        results.truncate(k);
        Ok(results)
    }

    /// Walks `layer` from `entry`, moving to any strictly closer neighbor
    /// until none improves. Returns the local minimum.
    pub(super) fn greedy_closest(&self, query: &[f32], entry: NodeId, layer: usize) -> NodeId {
        let mut best = entry;
        let mut best_dist = squared_euclidean(query, self.vectors.vector(entry));

        loop {
            let mut improved = false;
            for &neighbor in self.neighbors(best, layer) {
                let dist = squared_euclidean(query, self.vectors.vector(neighbor));
                if dist < best_dist || (dist == best_dist && neighbor < best) {
                    best = neighbor;
                    best_dist = dist;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }

        best
    }

    /// Best-first beam search over one layer.
    ///
    /// Keeps the `ef` closest nodes seen so far; stops once the closest
    /// unexpanded candidate is farther than the worst kept result. Returns
    /// the kept set sorted by `(distance, position)`.
    pub(super) fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[NodeId],
        ef: usize,
        layer: usize,
    ) -> Vec<(NodeId, f32)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ep in entry_points {
            if !visited.insert(ep) {
                continue;
            }
            let seed = Candidate::new(squared_euclidean(query, self.vectors.vector(ep)), ep);
            candidates.push(Reverse(seed));
            results.push(seed);
            if results.len() > ef {
                results.pop();
            }
        }

        while let Some(Reverse(current)) = candidates.pop() {
            if results.len() >= ef && results.peek().is_some_and(|&worst| current > worst) {
                break;
            }

            for &neighbor in self.neighbors(current.node, layer) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let next =
                    Candidate::new(squared_euclidean(query, self.vectors.vector(neighbor)), neighbor);
                let admits =
                    results.len() < ef || results.peek().is_some_and(|&worst| next < worst);
                if admits {
                    candidates.push(Reverse(next));
                    results.push(next);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut sorted = results.into_vec();
        sorted.sort_unstable();
        sorted.into_iter().map(Candidate::into_pair).collect()
    }
}
