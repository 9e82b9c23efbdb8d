//! Query path: validate, embed, search, optionally re-rank.

use super::DocumentIndex;
use crate::error::{Error, Result};
use crate::guard::Neighbor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A similarity query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text.
    pub query: String,
    /// Number of results.
    pub k: usize,
    /// Beam width override; the index default applies when `None`.
    #[serde(default)]
    pub ef: Option<usize>,
    /// Re-rank the primary hits in the reduced space.
    #[serde(default)]
    pub rerank: bool,
}

impl SearchRequest {
    /// Creates a request for the `k` nearest documents.
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        Self {
            query: query.into(),
            k,
            ef: None,
            rerank: false,
        }
    }

    /// Overrides the beam width.
    #[must_use]
    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = Some(ef);
        self
    }

    /// Requests re-ranking.
    #[must_use]
    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }
}

/// One ranked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document id.
    pub id: String,
    /// Squared Euclidean distance (ascending) or, when re-ranked, cosine
    /// similarity in the reduced space (descending).
    pub score: f32,
}

/// Whether and how re-ranking was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RerankStatus {
    /// The request did not ask for re-ranking.
    NotRequested,
    /// Hits were re-ordered by the reduced-space model.
    Applied {
        /// True if the model was fitted on the corpus currently indexed.
        consistent: bool,
    },
    /// Re-ranking was asked for but no model is attached; hits keep the
    /// primary order.
    Unavailable,
}

/// Ranked hits plus re-ranking status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Hits, best first.
    pub hits: Vec<SearchHit>,
    /// Re-ranking outcome.
    pub rerank: RerankStatus,
}

fn primary_hits(neighbors: Vec<Neighbor>) -> Vec<SearchHit> {
    neighbors
        .into_iter()
        .map(|n| SearchHit {
            id: n.id,
            score: n.distance,
        })
        .collect()
}

impl DocumentIndex {
    /// Returns the `k` documents nearest to `request.query`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty query, `k` outside `1..=max_k`, or
    ///   an `ef` override outside `1..=max_ef`. Checked before embedding.
    /// - `EmptyIndex` if nothing is indexed. Checked before embedding.
    /// - `Embedding` / `DimensionMismatch` if the provider fails.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.validate_request(request)?;
        if self.guard.is_empty() {
            warn!("Search on an empty index");
            return Err(Error::EmptyIndex);
        }

        let query = self.embed(&request.query)?;
        let k = request.k;
        let ef = request.ef.unwrap_or_else(|| self.guard.ef_search()).max(k);
        let neighbors = self.guard.search(&query, k, ef)?;
        debug!(k, ef, hits = neighbors.len(), "Search completed");

        if !request.rerank {
            return Ok(SearchResponse {
                hits: primary_hits(neighbors),
                rerank: RerankStatus::NotRequested,
            });
        }

        let model = self.reranker.read().clone();
        let Some(model) = model else {
            debug!("Re-ranking requested but no model attached");
            return Ok(SearchResponse {
                hits: primary_hits(neighbors),
                rerank: RerankStatus::Unavailable,
            });
        };

        let consistent = model.is_consistent_with(self.guard.corpus_fingerprint(), self.len());
        if !consistent {
            warn!(
                model_corpus_size = model.corpus_size(),
                indexed = self.len(),
                "Re-ranking with a model fitted on a different corpus"
            );
        }

        let positions: Vec<_> = neighbors.iter().map(|n| n.position).collect();
        let vectors = self.guard.vectors_at(&positions);
        let candidates = neighbors
            .into_iter()
            .zip(vectors)
            .filter_map(|(n, v)| v.map(|v| (n, v)))
            .collect();
        let reranked = model.rerank(&query, candidates)?;

        Ok(SearchResponse {
            hits: reranked
                .into_iter()
                .map(|(n, similarity)| SearchHit {
                    id: n.id,
                    score: similarity,
                })
                .collect(),
            rerank: RerankStatus::Applied { consistent },
        })
    }

    fn validate_request(&self, request: &SearchRequest) -> Result<()> {
        if request.query.trim().is_empty() {
            return Err(Error::InvalidArgument("query text is empty".to_string()));
        }
        if request.k == 0 || request.k > self.search_limits.max_k {
            return Err(Error::InvalidArgument(format!(
                "k {} is out of range [1, {}]",
                request.k, self.search_limits.max_k
            )));
        }
        if let Some(ef) = request.ef {
            if ef == 0 || ef > self.search_limits.max_ef {
                return Err(Error::InvalidArgument(format!(
                    "ef {ef} is out of range [1, {}]",
                    self.search_limits.max_ef
                )));
            }
        }
        if request.query.len() > self.ingest.max_text_len {
            return Err(Error::InvalidArgument(format!(
                "query is {} bytes, limit {}",
                request.query.len(),
                self.ingest.max_text_len
            )));
        }
        Ok(())
    }
}
