//! Batch ingestion with deduplication.

use super::DocumentIndex;
use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// A document to index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id.
    pub id: String,
    /// Text to embed.
    pub text: String,
}

impl Document {
    /// Creates a document.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Outcome of an ingest call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents inserted.
    pub accepted: usize,
    /// Documents dropped because their id was already indexed or repeated
    /// earlier in the batch.
    pub skipped: usize,
    /// Documents in the index after the call.
    pub total_indexed: usize,
}

impl IngestReport {
    fn merge(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.skipped += other.skipped;
        self.total_indexed = other.total_indexed;
    }
}

impl DocumentIndex {
    /// Indexes one batch atomically with respect to other writers.
    ///
    /// Every document is validated before anything is embedded. Ids that
    /// are already indexed, or repeat an earlier id in the batch, are
    /// skipped (first occurrence wins). Embedding happens before the write
    /// lock is taken; insertion then runs under a single write
    /// acquisition. With `storage.persist_on_batch`, the new state is on
    /// disk before this returns.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty id, an empty text, or a text longer
    ///   than `ingest.max_text_len`. Nothing is indexed.
    /// - `Embedding` / `DimensionMismatch` if the provider fails or returns
    ///   a bad vector. Nothing is indexed.
    /// - `ResourceExhausted` if the graph cannot grow. Documents inserted
    ///   before the failure stay indexed and are persisted.
    /// - `Io` if persisting fails. The batch stays indexed in memory and
    ///   the next flush retries.
    pub fn index_documents(&self, documents: &[Document]) -> Result<IngestReport> {
        self.validate_batch(documents)?;

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut fresh: Vec<&Document> = Vec::with_capacity(documents.len());
        let mut skipped = 0;
        for doc in documents {
            if seen.insert(doc.id.as_str()) {
                fresh.push(doc);
            } else {
                debug!(id = %doc.id, "Skipping id repeated within batch");
                skipped += 1;
            }
        }

        let fresh_ids: Vec<&str> = fresh.iter().map(|d| d.id.as_str()).collect();
        let known = self.guard.known_ids(&fresh_ids);
        let mut embedded: Vec<(String, Vec<f32>)> = Vec::new();
        embedded.try_reserve_exact(fresh.len())?;
        for (doc, is_known) in fresh.into_iter().zip(known) {
            if is_known {
                debug!(id = %doc.id, "Skipping already indexed id");
                skipped += 1;
                continue;
            }
            embedded.push((doc.id.clone(), self.embed(&doc.text)?));
        }

        if embedded.is_empty() {
            debug!(skipped, "Batch contained no new documents");
            return Ok(IngestReport {
                accepted: 0,
                skipped,
                total_indexed: self.guard.len(),
            });
        }

        let outcome = self.guard.insert_batch(embedded);
        let report = IngestReport {
            accepted: outcome.accepted,
            skipped: skipped + outcome.skipped,
            total_indexed: outcome.total,
        };

        if let Some(err) = outcome.aborted {
            error!(
                accepted = report.accepted,
                total = report.total_indexed,
                error = %err,
                "Batch aborted"
            );
            if report.accepted > 0 && self.persist_on_batch {
                if let Err(persist_err) = self.flush() {
                    error!(error = %persist_err, "Failed to persist partial batch");
                }
            }
            return Err(err);
        }

        if self.persist_on_batch && report.accepted > 0 {
            self.flush()?;
        }

        info!(
            accepted = report.accepted,
            skipped = report.skipped,
            total = report.total_indexed,
            generation = outcome.generation,
            "Batch indexed"
        );
        Ok(report)
    }

    /// Indexes `documents` in consecutive batches of `ingest.batch_size`.
    ///
    /// Each batch is atomic on its own; a failure stops at the failing
    /// batch and earlier batches stay indexed.
    ///
    /// # Errors
    ///
    /// Same as [`DocumentIndex::index_documents`].
    pub fn index_in_batches(&self, documents: &[Document]) -> Result<IngestReport> {
        let mut total = IngestReport {
            total_indexed: self.guard.len(),
            ..IngestReport::default()
        };
        for chunk in documents.chunks(self.ingest.batch_size.max(1)) {
            total.merge(self.index_documents(chunk)?);
        }
        Ok(total)
    }

    fn validate_batch(&self, documents: &[Document]) -> Result<()> {
        for (i, doc) in documents.iter().enumerate() {
            if doc.id.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "document {i} has an empty id"
                )));
            }
            if doc.text.trim().is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "document '{}' has an empty text",
                    doc.id
                )));
            }
            if doc.text.len() > self.ingest.max_text_len {
                return Err(Error::InvalidArgument(format!(
                    "document '{}' text is {} bytes, limit {}",
                    doc.id,
                    doc.text.len(),
                    self.ingest.max_text_len
                )));
            }
        }
        Ok(())
    }
}
