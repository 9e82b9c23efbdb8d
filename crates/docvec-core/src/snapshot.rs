//! Read-only views for analytics jobs and operators.
//!
//! A snapshot is taken under a single guard acquisition, so clustering or
//! similarity-graph jobs always see a set of vectors and ids that existed
//! together at one generation.

use crate::index::{GraphParams, NodeId, Position};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Position in the vector store.
    pub position: Position,
    /// Document id.
    pub id: String,
    /// Stored embedding.
    pub vector: Vec<f32>,
}

/// Consistent copy of the whole index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Generation the copy was taken at.
    pub generation: u64,
    /// Vector dimension.
    pub dimension: usize,
    /// Entries in position order.
    pub entries: Vec<SnapshotEntry>,
}

impl IndexSnapshot {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes one JSON object per entry.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` on failure.
    pub fn write_jsonl<W: Write>(&self, mut out: W) -> crate::Result<()> {
        for entry in &self.entries {
            serde_json::to_writer(&mut out, entry)
                .map_err(|e| crate::Error::Serialization(e.to_string()))?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Structural summary of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Indexed documents.
    pub documents: usize,
    /// Vector dimension.
    pub dimension: usize,
    /// Highest populated layer.
    pub max_layer: usize,
    /// Entry point position, `None` while empty.
    pub entry_point: Option<NodeId>,
    /// Graph parameters.
    pub params: GraphParams,
    /// Mutation counter.
    pub generation: u64,
    /// CRC32 of the id sequence; compared against re-ranking models.
    pub corpus_fingerprint: u32,
}
