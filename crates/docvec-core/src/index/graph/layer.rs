//! A single layer of the graph: per-node adjacency lists.

/// Position of a node in the graph (same as its vector-store position).
pub type NodeId = usize;

/// Adjacency lists for one layer, indexed by node position.
///
/// A node absent from this layer simply has an empty list.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub(crate) neighbors: Vec<Vec<NodeId>>,
}

impl Layer {
    /// Creates an empty layer.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserves outer slots so that `node_id` fits without reallocating.
    pub(crate) fn try_reserve_for(
        &mut self,
        node_id: NodeId,
    ) -> Result<(), std::collections::TryReserveError> {
        let needed = (node_id + 1).saturating_sub(self.neighbors.len());
        self.neighbors.try_reserve(needed)
    }

    /// Ensures the layer has a slot for `node_id`.
    pub(crate) fn ensure_capacity(&mut self, node_id: NodeId) {
        while self.neighbors.len() <= node_id {
            self.neighbors.push(Vec::new());
        }
    }

    /// Neighbors of `node_id` on this layer.
    #[inline]
    pub(crate) fn neighbors(&self, node_id: NodeId) -> &[NodeId] {
        self.neighbors.get(node_id).map_or(&[], Vec::as_slice)
    }

    /// Replaces the neighbor list of `node_id`.
    pub(crate) fn set_neighbors(&mut self, node_id: NodeId, neighbors: Vec<NodeId>) {
        if let Some(slot) = self.neighbors.get_mut(node_id) {
            *slot = neighbors;
        }
    }

    /// Mutable neighbor list of `node_id`, if it has a slot.
    pub(crate) fn neighbors_mut(&mut self, node_id: NodeId) -> Option<&mut Vec<NodeId>> {
        self.neighbors.get_mut(node_id)
    }
}
