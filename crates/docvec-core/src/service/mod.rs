//! Document index service.
//!
//! [`DocumentIndex`] owns the guarded index state, the embedding provider
//! and the artifact store, and drives the load → mutate → save lifecycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use docvec_core::{DocumentIndex, DocvecConfig, Document, HashingEmbedder, SearchRequest};
//! use std::sync::Arc;
//!
//! let config = DocvecConfig::load()?;
//! let index = DocumentIndex::open(&config, Arc::new(HashingEmbedder::default()))?;
//!
//! let report = index.index_documents(&[
//!     Document::new("a", "cats are mammals"),
//!     Document::new("b", "dogs are mammals"),
//! ])?;
//! assert_eq!(report.accepted, 2);
//!
//! let response = index.search(&SearchRequest::new("feline pets", 2))?;
//! index.close()?;
//! ```

mod ingest;
pub mod rerank;
mod search;

pub use ingest::{Document, IngestReport};
pub use rerank::ReducedSpaceModel;
pub use search::{RerankStatus, SearchHit, SearchRequest, SearchResponse};

use crate::config::{DocvecConfig, IngestConfig, SearchConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::guard::{IndexGuard, IndexState};
use crate::index::{GraphParams, Position};
use crate::persistence::IndexStore;
use crate::snapshot::{IndexSnapshot, IndexStats};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// A semantic document index: embedding, ANN graph and persistence.
///
/// All methods take `&self`; share it across threads with `Arc`.
pub struct DocumentIndex {
    guard: IndexGuard,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Option<IndexStore>,
    ingest: IngestConfig,
    search_limits: SearchConfig,
    persist_on_batch: bool,
    reranker: RwLock<Option<Arc<ReducedSpaceModel>>>,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("documents", &self.guard.len())
            .field("dimension", &self.embedder.dimension())
            .field("store", &self.store.as_ref().map(IndexStore::dir))
            .finish_non_exhaustive()
    }
}

impl DocumentIndex {
    /// Opens the index persisted under `config.storage.data_dir`, or an
    /// empty one if nothing is stored there.
    ///
    /// A persisted graph keeps the parameters it was built with; the
    /// configured `index` section only applies to new indexes.
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration is invalid.
    /// - `CorruptPersistedState` if stored artifacts are unreadable,
    ///   inconsistent.
    /// - `DimensionMismatch` if stored artifacts were built for another
    ///   dimension than the embedder's.
    /// - `Io` if a stored file cannot be read.
    pub fn open(config: &DocvecConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        config.validate()?;
        let dimension = embedder.dimension();
        let wanted = config.graph_params(dimension);
        wanted.validate()?;

        let store = IndexStore::new(&config.storage.data_dir);
        let guard = match store.load(Some(dimension))? {
            Some(loaded) => {
                let params = *loaded.graph.params();
                if params != wanted {
                    warn!(
                        stored_m = params.max_connections,
                        stored_ef_construction = params.ef_construction,
                        stored_ef_search = params.ef_search,
                        "Persisted graph parameters differ from configuration, keeping persisted ones"
                    );
                }
                let state = IndexState::new(loaded.graph, loaded.ids)?;
                if loaded.truncated {
                    IndexGuard::new_dirty(state)
                } else {
                    IndexGuard::new(state)
                }
            }
            None => IndexGuard::new(IndexState::empty(wanted)?),
        };

        Ok(Self {
            guard,
            embedder,
            store: Some(store),
            ingest: config.ingest.clone(),
            search_limits: config.search.clone(),
            persist_on_batch: config.storage.persist_on_batch,
            reranker: RwLock::new(None),
        })
    }

    /// Creates an empty, non-persistent index.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `params` are invalid.
    /// - `DimensionMismatch` if `params.dimension` differs from the
    ///   embedder's dimension.
    pub fn in_memory(params: GraphParams, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if params.dimension != embedder.dimension() {
            return Err(Error::DimensionMismatch {
                expected: params.dimension,
                actual: embedder.dimension(),
            });
        }
        let defaults = DocvecConfig::default();
        Ok(Self {
            guard: IndexGuard::new(IndexState::empty(params)?),
            embedder,
            store: None,
            ingest: defaults.ingest,
            search_limits: defaults.search,
            persist_on_batch: false,
            reranker: RwLock::new(None),
        })
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// True if no document is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Index dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.guard.dimension()
    }

    /// True if `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.guard.contains(id)
    }

    /// Document id at `position`.
    #[must_use]
    pub fn id_at(&self, position: Position) -> Option<String> {
        self.guard.id_at(position)
    }

    /// Mutation counter; bumps once per batch that inserted anything.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.guard.generation()
    }

    /// Structural summary.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        self.guard.stats()
    }

    /// Consistent copy of every `(position, id, vector)` for analytics.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExhausted` if the copy cannot be allocated.
    pub fn snapshot(&self) -> Result<IndexSnapshot> {
        self.guard.snapshot()
    }

    /// Installs a re-ranking model.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the model's input dimension is not
    /// the index dimension.
    pub fn attach_reranker(&self, model: ReducedSpaceModel) -> Result<()> {
        let dimension = self.dimension();
        if model.input_dim() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: model.input_dim(),
            });
        }
        if !model.is_consistent_with(self.guard.corpus_fingerprint(), self.len()) {
            warn!(
                model_corpus_size = model.corpus_size(),
                indexed = self.len(),
                "Re-ranking model was fitted on a different corpus"
            );
        }
        *self.reranker.write() = Some(Arc::new(model));
        Ok(())
    }

    /// Removes the re-ranking model, returning it.
    pub fn detach_reranker(&self) -> Option<Arc<ReducedSpaceModel>> {
        self.reranker.write().take()
    }

    /// Persists unsaved changes. Returns `true` if files were written.
    ///
    /// In-memory indexes never write.
    ///
    /// # Errors
    ///
    /// Propagates encoding and I/O errors.
    pub fn flush(&self) -> Result<bool> {
        match &self.store {
            Some(store) => self.guard.persist(store),
            None => Ok(false),
        }
    }

    /// Flushes and releases the index.
    ///
    /// # Errors
    ///
    /// Propagates [`DocumentIndex::flush`] errors.
    pub fn close(self) -> Result<()> {
        self.flush()?;
        info!(documents = self.len(), "Index closed");
        Ok(())
    }

    /// Embeds one text and checks the result.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.encode(text)?;
        let dimension = self.guard.dimension();
        if vector.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
        if !vector.iter().all(|x| x.is_finite()) {
            return Err(Error::Embedding(
                "provider returned a non-finite component".to_string(),
            ));
        }
        Ok(vector)
    }
}
