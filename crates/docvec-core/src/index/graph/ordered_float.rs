//! Heap keys for graph traversal.
//!
//! Distances are compared with `f32::total_cmp`, so a NaN can never break
//! the heap invariants. Candidates order by `(distance, position)`: equal
//! distances resolve to the lower position, which keeps search results
//! deterministic.

use super::layer::NodeId;
use std::cmp::Ordering;

/// `f32` with a total order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderedFloat(pub f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A node and its squared distance to the query.
///
/// Field order drives the derived `Ord`: distance first, then position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Candidate {
    pub distance: OrderedFloat,
    pub node: NodeId,
}

impl Candidate {
    pub(crate) fn new(distance: f32, node: NodeId) -> Self {
        Self {
            distance: OrderedFloat(distance),
            node,
        }
    }

    /// `(position, distance)` as returned by searches.
    pub(crate) fn into_pair(self) -> (NodeId, f32) {
        (self.node, self.distance.0)
    }
}
