//! Reduced-space re-ranking.
//!
//! A [`ReducedSpaceModel`] is a linear projection (for example truncated
//! SVD components) fitted offline. It is its own versioned artifact and
//! records the fingerprint of the corpus it was fitted on; re-ranking with
//! a model fitted on another corpus still runs, but is reported as
//! inconsistent.

use crate::distance::{cosine_similarity, dot};
use crate::error::{Error, Result};
use crate::guard::Neighbor;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model artifact format version.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Linear projection `components · (v − mean)` into a reduced space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedSpaceModel {
    version: u32,
    input_dim: usize,
    output_dim: usize,
    /// Row-major `output_dim × input_dim`.
    components: Vec<f32>,
    mean: Vec<f32>,
    corpus_fingerprint: u32,
    corpus_size: usize,
}

impl ReducedSpaceModel {
    /// Builds a model from explicit components.
    ///
    /// `components` is row-major with `input_dim` columns; `mean` is empty
    /// (no centering) or has `input_dim` entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the shapes are inconsistent or a value
    /// is not finite.
    pub fn new(
        input_dim: usize,
        components: Vec<f32>,
        mean: Vec<f32>,
        corpus_fingerprint: u32,
        corpus_size: usize,
    ) -> Result<Self> {
        if input_dim == 0 || components.is_empty() || components.len() % input_dim != 0 {
            return Err(Error::InvalidArgument(format!(
                "{} components do not form rows of length {input_dim}",
                components.len()
            )));
        }
        let mean = if mean.is_empty() {
            vec![0.0; input_dim]
        } else {
            mean
        };
        if mean.len() != input_dim {
            return Err(Error::DimensionMismatch {
                expected: input_dim,
                actual: mean.len(),
            });
        }
        if !components.iter().chain(&mean).all(|x| x.is_finite()) {
            return Err(Error::InvalidArgument(
                "model contains non-finite values".to_string(),
            ));
        }
        Ok(Self {
            version: MODEL_FORMAT_VERSION,
            input_dim,
            output_dim: components.len() / input_dim,
            components,
            mean,
            corpus_fingerprint,
            corpus_size,
        })
    }

    /// Input (index) dimension.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Reduced dimension.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Fingerprint of the corpus the model was fitted on.
    #[must_use]
    pub fn corpus_fingerprint(&self) -> u32 {
        self.corpus_fingerprint
    }

    /// Number of documents the model was fitted on.
    #[must_use]
    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    /// True if the model was fitted on exactly this corpus.
    #[must_use]
    pub fn is_consistent_with(&self, corpus_fingerprint: u32, corpus_size: usize) -> bool {
        self.corpus_fingerprint == corpus_fingerprint && self.corpus_size == corpus_size
    }

    /// Projects `vector` into the reduced space.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `vector.len() != input_dim`.
    pub fn project(&self, vector: &[f32]) -> Result<Vec<f32>> {
        if vector.len() != self.input_dim {
            return Err(Error::DimensionMismatch {
                expected: self.input_dim,
                actual: vector.len(),
            });
        }
        let centered: Vec<f32> = vector.iter().zip(&self.mean).map(|(x, m)| x - m).collect();
        Ok(self
            .components
            .chunks_exact(self.input_dim)
            .map(|row| dot(row, &centered))
            .collect())
    }

    /// Re-orders `candidates` by cosine similarity to `query` in the
    /// reduced space, highest first. Ties keep the primary order.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if a vector has the wrong length.
    pub fn rerank(
        &self,
        query: &[f32],
        candidates: Vec<(Neighbor, Vec<f32>)>,
    ) -> Result<Vec<(Neighbor, f32)>> {
        let reduced_query = self.project(query)?;
        let mut scored = candidates
            .into_iter()
            .map(|(neighbor, vector)| {
                let reduced = self.project(&vector)?;
                Ok((neighbor, cosine_similarity(&reduced_query, &reduced)))
            })
            .collect::<Result<Vec<_>>>()?;
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then(a.0.distance.total_cmp(&b.0.distance))
                .then(a.0.position.cmp(&b.0.position))
        });
        Ok(scored)
    }

    /// Serializes the model with bincode.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes and validates a model.
    ///
    /// # Errors
    ///
    /// Returns `CorruptPersistedState` if the bytes do not decode, the
    /// version is unknown, or the shapes are inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self = bincode::deserialize(bytes)
            .map_err(|e| Error::corrupt(format!("malformed re-ranking model: {e}")))?;
        if model.version != MODEL_FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported re-ranking model version {}",
                model.version
            )));
        }
        let rebuilt = Self::new(
            model.input_dim,
            model.components,
            model.mean,
            model.corpus_fingerprint,
            model.corpus_size,
        )
        .map_err(|e| Error::corrupt(format!("invalid re-ranking model: {e}")))?;
        if rebuilt.output_dim != model.output_dim {
            return Err(Error::corrupt("re-ranking model output dimension mismatch"));
        }
        Ok(rebuilt)
    }

    /// Writes the model to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `Io` on failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Reads a model from `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `CorruptPersistedState`
    /// if it does not decode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }
}
