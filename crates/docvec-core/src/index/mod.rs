//! Index data structures: vector arena, id mapping and the layered graph.
//!
//! These types are plain owned data with no locking. Concurrent access goes
//! through [`crate::guard::IndexGuard`].

pub mod graph;
pub mod id_map;
pub mod params;
pub mod vector_store;

pub use graph::{GraphParts, LayeredGraph, NodeId};
pub use id_map::IdMapping;
pub use params::GraphParams;
pub use vector_store::{Position, VectorStore};

#[cfg(test)]
mod vector_store_tests;
