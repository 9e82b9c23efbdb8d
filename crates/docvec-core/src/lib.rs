//! # docvec Core
//!
//! Semantic document index built on a native HNSW graph.
//!
//! Documents are embedded by a pluggable [`EmbeddingProvider`], inserted
//! into a layered proximity graph, and persisted after every batch so an
//! acknowledged batch survives a crash.
//!
//! ## Features
//!
//! - **Native HNSW**: layered graph with heuristic neighbor selection and
//!   symmetric pruning, squared Euclidean distance with explicit SIMD
//! - **Dedup**: ids already indexed or repeated in a batch are skipped
//! - **Crash-safe persistence**: checksummed graph file plus JSON id file,
//!   both written temp → fsync → rename, fail-closed loading
//! - **Concurrent access**: reader/writer guard, one write acquisition per
//!   batch, persistence I/O outside the lock
//! - **Re-ranking**: optional reduced-space cosine re-ranking with corpus
//!   consistency reporting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docvec_core::{Document, DocumentIndex, DocvecConfig, HashingEmbedder, SearchRequest};
//! use std::sync::Arc;
//!
//! let config = DocvecConfig::load()?;
//! let index = DocumentIndex::open(&config, Arc::new(HashingEmbedder::default()))?;
//!
//! index.index_documents(&[Document::new("a", "cats are mammals")])?;
//! let response = index.search(&SearchRequest::new("feline pets", 5))?;
//! for hit in &response.hits {
//!     println!("{} {}", hit.id, hit.score);
//! }
//! index.close()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::redundant_pub_crate)]

pub mod config;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod guard;
pub mod index;
pub mod persistence;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod distance_tests;
#[cfg(test)]
mod embedding_tests;
#[cfg(test)]
mod error_tests;

pub use config::{ConfigError, DocvecConfig};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{Error, Result};
pub use guard::{IndexGuard, IndexState, Neighbor};
pub use index::{GraphParams, IdMapping, LayeredGraph, NodeId, Position, VectorStore};
pub use persistence::IndexStore;
pub use service::{
    Document, DocumentIndex, IngestReport, ReducedSpaceModel, RerankStatus, SearchHit,
    SearchRequest, SearchResponse,
};
pub use snapshot::{IndexSnapshot, IndexStats, SnapshotEntry};
