//! Layered proximity graph (HNSW).
//!
//! Hierarchical navigable small world graph as described by Malkov &
//! Yashunin, "Efficient and robust approximate nearest neighbor search using
//! Hierarchical Navigable Small World graphs" (arXiv:1603.09320).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            LayeredGraph                 │
//! ├─────────────────────────────────────────┤
//! │  vectors: VectorStore  (arena)          │
//! │  levels:  Vec<usize>   (per node)       │
//! │  layers:  Vec<Layer>   (0 = densest)    │
//! │  entry_point: Option<NodeId>            │
//! │  params: GraphParams                    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Neighbors are plain positions into the vector store, so the graph owns
//! no references into itself. The graph has no interior locking: callers
//! reach it through [`crate::guard::IndexGuard`], which hands out `&mut`
//! for inserts and `&` for searches.
//!
//! # Invariants
//!
//! - `levels.len() == vectors.len()`.
//! - A node appears on every layer `0..=levels[node]`.
//! - Each list on layer `l` holds at most `params.max_connections_at(l)`
//!   distinct positions, none equal to the node itself, each on layer `l`.
//! - Edges are symmetric: if A lists B on layer `l`, B lists A.
//! - The entry point is the first-inserted node with the highest level.

mod insert;
pub(crate) mod layer;
mod ordered_float;
mod search;

pub use layer::NodeId;

use super::params::GraphParams;
use super::vector_store::VectorStore;
use crate::error::{Error, Result};
use layer::Layer;

/// Initial xorshift64 state for layer draws.
const DEFAULT_RNG_SEED: u64 = 0x5DEE_CE66_D1A4_B5B5;

/// Multi-layer proximity graph over a vector store.
#[derive(Debug, Clone)]
pub struct LayeredGraph {
    params: GraphParams,
    vectors: VectorStore,
    levels: Vec<usize>,
    layers: Vec<Layer>,
    entry_point: Option<NodeId>,
    max_layer: usize,
    rng_state: u64,
}

/// Decoded graph contents, validated by [`LayeredGraph::from_parts`].
#[derive(Debug)]
pub struct GraphParts {
    /// Graph parameters.
    pub params: GraphParams,
    /// Vector arena.
    pub vectors: VectorStore,
    /// Per node, per layer `0..=level`, the neighbor positions.
    pub links: Vec<Vec<Vec<NodeId>>>,
    /// Layer-draw PRNG state.
    pub rng_state: u64,
}

impl LayeredGraph {
    /// Creates an empty graph.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `params` fail validation.
    pub fn new(params: GraphParams) -> Result<Self> {
        Self::with_seed(params, DEFAULT_RNG_SEED)
    }

    /// Creates an empty graph with an explicit layer-draw seed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `params` fail validation or `seed == 0`
    /// (xorshift has a fixed point at zero).
    pub fn with_seed(params: GraphParams, seed: u64) -> Result<Self> {
        params.validate()?;
        if seed == 0 {
            return Err(Error::InvalidArgument("rng seed must be non-zero".to_string()));
        }
        Ok(Self {
            params,
            vectors: VectorStore::new(params.dimension),
            levels: Vec::new(),
            layers: vec![Layer::new()],
            entry_point: None,
            max_layer: 0,
            rng_state: seed,
        })
    }

    /// Graph parameters.
    #[must_use]
    pub fn params(&self) -> &GraphParams {
        &self.params
    }

    /// Vector dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.params.dimension
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Current entry point, `None` while empty.
    #[must_use]
    pub fn entry_point(&self) -> Option<NodeId> {
        self.entry_point
    }

    /// Highest populated layer (0 while empty).
    #[must_use]
    pub fn max_layer(&self) -> usize {
        self.max_layer
    }

    /// Assigned top layer of `node`.
    #[must_use]
    pub fn level_of(&self, node: NodeId) -> Option<usize> {
        self.levels.get(node).copied()
    }

    /// Neighbors of `node` on `layer` (empty if the node is not on it).
    #[must_use]
    pub fn neighbors(&self, node: NodeId, layer: usize) -> &[NodeId] {
        self.layers.get(layer).map_or(&[], |l| l.neighbors(node))
    }

    /// The underlying vector arena.
    #[must_use]
    pub fn vectors(&self) -> &VectorStore {
        &self.vectors
    }

    /// Layer-draw PRNG state, persisted so reloaded graphs keep drawing
    /// the same sequence.
    #[must_use]
    pub fn rng_state(&self) -> u64 {
        self.rng_state
    }

    /// Rebuilds a graph from decoded parts, checking every structural
    /// invariant and deriving the entry point.
    ///
    /// # Errors
    ///
    /// Returns `CorruptPersistedState` on any violated invariant.
    pub fn from_parts(parts: GraphParts) -> Result<Self> {
        let GraphParts {
            params,
            vectors,
            links,
            rng_state,
        } = parts;

        params
            .validate()
            .map_err(|e| Error::corrupt(format!("invalid graph parameters: {e}")))?;
        if vectors.dimension() != params.dimension {
            return Err(Error::corrupt("vector dimension disagrees with header"));
        }
        if links.len() != vectors.len() {
            return Err(Error::corrupt(format!(
                "{} adjacency records for {} vectors",
                links.len(),
                vectors.len()
            )));
        }
        if rng_state == 0 {
            return Err(Error::corrupt("rng state is zero"));
        }

        let count = links.len();
        let mut levels = Vec::new();
        levels.try_reserve_exact(count)?;
        let mut max_layer = 0;
        let mut entry_point = None;
        for (node, node_links) in links.iter().enumerate() {
            let level = node_links
                .len()
                .checked_sub(1)
                .ok_or_else(|| Error::corrupt(format!("node {node} has no layer 0")))?;
            if level > GraphParams::MAX_LEVEL {
                return Err(Error::corrupt(format!("node {node} has level {level}")));
            }
            if entry_point.is_none() || level > max_layer {
                max_layer = level;
                entry_point = Some(node);
            }
            levels.push(level);
        }

        let mut layers: Vec<Layer> = (0..=max_layer).map(|_| Layer::new()).collect();
        for (node, node_links) in links.into_iter().enumerate() {
            for (layer_idx, list) in node_links.into_iter().enumerate() {
                let budget = params.max_connections_at(layer_idx);
                if list.len() > budget {
                    return Err(Error::corrupt(format!(
                        "node {node} has {} links on layer {layer_idx}, budget {budget}",
                        list.len()
                    )));
                }
                for (i, &neighbor) in list.iter().enumerate() {
                    if neighbor >= count || neighbor == node {
                        return Err(Error::corrupt(format!(
                            "node {node} links invalid position {neighbor}"
                        )));
                    }
                    if levels[neighbor] < layer_idx {
                        return Err(Error::corrupt(format!(
                            "node {node} links {neighbor} above its level on layer {layer_idx}"
                        )));
                    }
                    if list[..i].contains(&neighbor) {
                        return Err(Error::corrupt(format!(
                            "node {node} links {neighbor} twice on layer {layer_idx}"
                        )));
                    }
                }
                let layer = &mut layers[layer_idx];
                layer.try_reserve_for(node)?;
                layer.ensure_capacity(node);
                layer.set_neighbors(node, list);
            }
        }

        let graph = Self {
            params,
            vectors,
            levels,
            layers,
            entry_point,
            max_layer,
            rng_state,
        };

        if let Some((a, b, layer)) = graph.first_asymmetric_edge() {
            return Err(Error::corrupt(format!(
                "edge {a} -> {b} on layer {layer} has no reverse edge"
            )));
        }

        Ok(graph)
    }

    /// Finds an edge without its reverse, if any.
    #[must_use]
    pub fn first_asymmetric_edge(&self) -> Option<(NodeId, NodeId, usize)> {
        for (layer_idx, layer) in self.layers.iter().enumerate() {
            for (node, list) in layer.neighbors.iter().enumerate() {
                for &neighbor in list {
                    if !layer.neighbors(neighbor).contains(&node) {
                        return Some((node, neighbor, layer_idx));
                    }
                }
            }
        }
        None
    }

    /// xorshift64 step returning a layer from the geometric distribution
    /// `floor(-ln(U) / ln(M))`, capped at [`GraphParams::MAX_LEVEL`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn random_level(&mut self) -> usize {
        let mut state = self.rng_state;
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state = state;

        let uniform = (state as f64) / (u64::MAX as f64);
        let level = (-uniform.ln() * self.params.level_mult()).floor() as usize;
        level.min(GraphParams::MAX_LEVEL)
    }
}

#[cfg(test)]
mod layer_tests;
#[cfg(test)]
mod ordered_float_tests;
