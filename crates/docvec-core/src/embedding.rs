//! Embedding provider seam.
//!
//! The index never computes embeddings itself; it asks an
//! [`EmbeddingProvider`]. [`HashingEmbedder`] is a deterministic,
//! model-free provider (feature hashing of words and character trigrams)
//! used by the CLI and tests.

use crate::distance::normalize_in_place;
use crate::error::Result;
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for a fixed model and always
/// return vectors of [`EmbeddingProvider::dimension`] components.
pub trait EmbeddingProvider: Send + Sync {
    /// Output dimension, fixed for the provider's lifetime.
    fn dimension(&self) -> usize;

    /// Encodes one text.
    ///
    /// # Errors
    ///
    /// Returns `Embedding` if the provider cannot encode the text.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;
}

/// Feature-hashing embedder.
///
/// Lower-cased alphanumeric words and the character trigrams of each
/// space-padded word are hashed into `dimension` signed buckets, then the
/// vector is L2-normalized. Texts sharing words or word fragments land
/// close together.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Default output dimension.
    pub const DEFAULT_DIMENSION: usize = 256;

    const WORD_WEIGHT: f32 = 1.0;
    const TRIGRAM_WEIGHT: f32 = 0.5;

    /// Creates an embedder with `dimension` buckets (at least 1).
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let mut hasher = FxHasher::default();
        hasher.write(feature);
        let hash = hasher.finish();
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dimension];
        let lowered = text.to_lowercase();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.add_feature(&mut vector, word.as_bytes(), Self::WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            let mut buf = [0u8; 12];
            for window in padded.windows(3) {
                let mut len = 0;
                for c in window {
                    len += c.encode_utf8(&mut buf[len..]).len();
                }
                self.add_feature(&mut vector, &buf[..len], Self::TRIGRAM_WEIGHT);
            }
        }
        normalize_in_place(&mut vector);
        Ok(vector)
    }
}
