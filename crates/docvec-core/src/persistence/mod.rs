//! Persistence codec and artifact store.
//!
//! The graph (vectors, levels, adjacency, parameters) is stored in a
//! checksummed binary file; the id mapping in a separate JSON file so a
//! damaged graph never takes the id history with it.

pub mod checksum;
pub mod codec;
pub mod store;

pub use codec::{decode_graph, decode_ids, encode_graph, encode_ids, DecodedGraph};
pub use store::{EncodedState, IndexStore, LoadedState, GRAPH_FILE, IDS_FILE};

use crate::error::Result;
use crate::index::{IdMapping, LayeredGraph};

/// Encodes both artifacts for `graph` and `ids`.
///
/// # Errors
///
/// Propagates encoder errors.
pub fn encode_state(
    graph: &LayeredGraph,
    ids: &IdMapping,
    generation: u64,
) -> Result<EncodedState> {
    Ok(EncodedState {
        generation,
        node_count: graph.len(),
        ids: encode_ids(ids.ids())?,
        graph: encode_graph(graph, ids.fingerprint())?,
    })
}

#[cfg(test)]
mod checksum_tests;
