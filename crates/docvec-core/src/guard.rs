//! Guarded access to the shared index state.
//!
//! [`IndexGuard`] is the only way to reach the graph, vector store and id
//! mapping once an index is open. It exposes whole operations (insert a
//! batch, search, snapshot, persist) rather than the internals, so no
//! caller can observe a node whose edges are being rewired.
//!
//! # Locking
//!
//! - `state`: reader/writer lock. Searches, stats and snapshots share it;
//!   a batch takes it exclusively, once.
//! - `save`: serializes persistence. It is taken before the read lock used
//!   to copy state, so two saves can never reorder and a stale copy is
//!   never written over a newer one. The file I/O itself runs with only
//!   `save` held.

use crate::error::{Error, Result};
use crate::index::{GraphParams, IdMapping, LayeredGraph, Position};
use crate::persistence::{encode_state, IndexStore};
use crate::snapshot::{IndexSnapshot, IndexStats, SnapshotEntry};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// Graph, vectors and ids, always the same length.
#[derive(Debug)]
pub struct IndexState {
    graph: LayeredGraph,
    ids: IdMapping,
    generation: u64,
}

impl IndexState {
    /// Pairs a graph with its id mapping.
    ///
    /// # Errors
    ///
    /// Returns `CorruptPersistedState` if the lengths differ.
    pub fn new(graph: LayeredGraph, ids: IdMapping) -> Result<Self> {
        if graph.len() != ids.len() {
            return Err(Error::corrupt(format!(
                "{} graph nodes but {} ids",
                graph.len(),
                ids.len()
            )));
        }
        Ok(Self {
            graph,
            ids,
            generation: 0,
        })
    }

    /// Empty state for the given parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the parameters are invalid.
    pub fn empty(params: GraphParams) -> Result<Self> {
        Self::new(LayeredGraph::new(params)?, IdMapping::new())
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no document is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Appends one document to the graph and the id mapping.
    ///
    /// Both sides reserve before either mutates, so on error neither
    /// changes.
    fn insert_document(&mut self, id: String, vector: &[f32]) -> Result<Position> {
        self.ids.try_reserve(1)?;
        let position = self.graph.insert(vector)?;
        let id_position = self.ids.push(id)?;
        debug_assert_eq!(position, id_position);
        Ok(position)
    }
}

/// Result of one guarded batch insert.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Documents inserted.
    pub accepted: usize,
    /// Documents whose id was already present when the lock was taken.
    pub skipped: usize,
    /// Documents in the index after the batch.
    pub total: usize,
    /// Generation after the batch.
    pub generation: u64,
    /// Error that stopped the batch early. Documents before it stay indexed.
    pub aborted: Option<Error>,
}

/// A search hit resolved to its document id.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Position in the vector store.
    pub position: Position,
    /// Document id.
    pub id: String,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// Reader/writer guard over [`IndexState`].
#[derive(Debug)]
pub struct IndexGuard {
    state: RwLock<IndexState>,
    /// Generation last written to disk.
    save: Mutex<u64>,
}

impl IndexGuard {
    /// Wraps a state whose current generation is already on disk.
    #[must_use]
    pub fn new(state: IndexState) -> Self {
        let generation = state.generation;
        Self {
            state: RwLock::new(state),
            save: Mutex::new(generation),
        }
    }

    /// Wraps a state that differs from what is on disk, so the next
    /// persist writes it even before any mutation.
    #[must_use]
    pub fn new_dirty(mut state: IndexState) -> Self {
        let persisted = state.generation;
        state.generation += 1;
        Self {
            state: RwLock::new(state),
            save: Mutex::new(persisted),
        }
    }

    /// Index dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.state.read().graph.dimension()
    }

    /// Default search beam width.
    #[must_use]
    pub fn ef_search(&self) -> usize {
        self.state.read().graph.params().ef_search
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// True if no document is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// True if `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.state.read().ids.contains(id)
    }

    /// Document id stored at `position`.
    #[must_use]
    pub fn id_at(&self, position: Position) -> Option<String> {
        self.state.read().ids.id_at(position).map(str::to_owned)
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Returns, for each id, whether it is already indexed, under one read
    /// acquisition.
    #[must_use]
    pub fn known_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<bool> {
        let state = self.state.read();
        ids.iter().map(|id| state.ids.contains(id.as_ref())).collect()
    }

    /// Inserts a batch of embedded documents under one write acquisition.
    ///
    /// Ids already present (for instance inserted by a concurrent batch
    /// after the caller's pre-check) are skipped. An insert error stops
    /// the batch; documents inserted before it are kept and the lengths of
    /// the vector store and id mapping stay equal.
    pub fn insert_batch(&self, documents: Vec<(String, Vec<f32>)>) -> BatchOutcome {
        let mut state = self.state.write();
        let mut accepted = 0;
        let mut skipped = 0;
        let mut aborted = None;

        for (id, vector) in documents {
            if state.ids.contains(&id) {
                debug!(id = %id, "Skipping id indexed concurrently");
                skipped += 1;
                continue;
            }
            match state.insert_document(id, &vector) {
                Ok(_) => accepted += 1,
                Err(err) => {
                    aborted = Some(err);
                    break;
                }
            }
        }

        if accepted > 0 {
            state.generation += 1;
        }
        BatchOutcome {
            accepted,
            skipped,
            total: state.len(),
            generation: state.generation,
            aborted,
        }
    }

    /// Searches the graph and maps positions to ids.
    ///
    /// # Errors
    ///
    /// Propagates graph search errors (`EmptyIndex`, `InvalidArgument`,
    /// `DimensionMismatch`).
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<Neighbor>> {
        let state = self.state.read();
        let hits = state.graph.search(query, k, ef)?;
        hits.into_iter()
            .map(|(position, distance)| {
                let id = state.ids.id_at(position).ok_or_else(|| {
                    Error::corrupt(format!("graph position {position} has no id"))
                })?;
                Ok(Neighbor {
                    position,
                    id: id.to_owned(),
                    distance,
                })
            })
            .collect()
    }

    /// Copies the stored vectors at `positions`, skipping unknown ones.
    #[must_use]
    pub fn vectors_at(&self, positions: &[Position]) -> Vec<Option<Vec<f32>>> {
        let state = self.state.read();
        positions
            .iter()
            .map(|&p| state.graph.vectors().get(p).map(<[f32]>::to_vec))
            .collect()
    }

    /// Structural summary under one read acquisition.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            documents: state.len(),
            dimension: state.graph.dimension(),
            max_layer: state.graph.max_layer(),
            entry_point: state.graph.entry_point(),
            params: *state.graph.params(),
            generation: state.generation,
            corpus_fingerprint: state.ids.fingerprint(),
        }
    }

    /// Fingerprint of the indexed id sequence.
    #[must_use]
    pub fn corpus_fingerprint(&self) -> u32 {
        self.state.read().ids.fingerprint()
    }

    /// Consistent copy of every `(position, id, vector)` under one read
    /// acquisition.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExhausted` if the copy cannot be allocated.
    pub fn snapshot(&self) -> Result<IndexSnapshot> {
        let state = self.state.read();
        let count = state.len();
        let mut entries = Vec::new();
        entries.try_reserve_exact(count)?;
        for (position, vector) in state.graph.vectors().iter().enumerate() {
            let id = state
                .ids
                .id_at(position)
                .ok_or_else(|| Error::corrupt(format!("graph position {position} has no id")))?;
            let mut copy = Vec::new();
            copy.try_reserve_exact(vector.len())?;
            copy.extend_from_slice(vector);
            entries.push(SnapshotEntry {
                position,
                id: id.to_owned(),
                vector: copy,
            });
        }
        Ok(IndexSnapshot {
            generation: state.generation,
            dimension: state.graph.dimension(),
            entries,
        })
    }

    /// Writes the current state to `store` unless it is already on disk.
    ///
    /// Returns `true` if files were written.
    ///
    /// # Errors
    ///
    /// Propagates encoding and I/O errors. On error the persisted
    /// generation is unchanged, so the next call retries.
    pub fn persist(&self, store: &IndexStore) -> Result<bool> {
        let mut persisted = self.save.lock();
        let encoded = {
            let state = self.state.read();
            if state.generation == *persisted {
                return Ok(false);
            }
            encode_state(&state.graph, &state.ids, state.generation)?
        };
        store.save(&encoded)?;
        *persisted = encoded.generation;
        Ok(true)
    }

    /// Generation last written to disk.
    #[must_use]
    pub fn persisted_generation(&self) -> u64 {
        *self.save.lock()
    }
}
