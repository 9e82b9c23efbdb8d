//! Shared helpers for integration tests.

#![allow(dead_code)]

use docvec_core::distance::normalize_in_place;
use docvec_core::{EmbeddingProvider, HashingEmbedder, Result};

const ANIMALS: &[&str] = &[
    "cat", "cats", "dog", "dogs", "feline", "canine", "pet", "pets", "kitten", "puppy",
    "mammal", "mammals",
];
const FINANCE: &[&str] = &[
    "stock", "stocks", "market", "markets", "shares", "rose", "fell", "earnings",
];

/// Embedder with two topic axes (animals, finance) plus a small hashed
/// residual so distinct texts stay distinct.
pub struct TopicEmbedder {
    residual: HashingEmbedder,
}

impl TopicEmbedder {
    pub const DIMENSION: usize = 16;

    pub fn new() -> Self {
        Self {
            residual: HashingEmbedder::new(Self::DIMENSION - 2),
        }
    }
}

impl EmbeddingProvider for TopicEmbedder {
    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let mut v = vec![0.0; Self::DIMENSION];
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if ANIMALS.contains(&word) {
                v[0] += 1.0;
            } else if FINANCE.contains(&word) {
                v[1] += 1.0;
            }
        }
        for (slot, r) in v[2..].iter_mut().zip(self.residual.encode(text)?) {
            *slot = 0.2 * r;
        }
        normalize_in_place(&mut v);
        Ok(v)
    }
}

/// Deterministic pseudo-random text corpus.
pub fn corpus(prefix: &str, count: usize) -> Vec<docvec_core::Document> {
    const WORDS: &[&str] = &[
        "river", "cloud", "engine", "garden", "signal", "copper", "violet", "harbor",
        "lantern", "meadow", "quartz", "saddle", "timber", "walnut", "zephyr", "orbit",
    ];
    let mut x: u64 = 0x2545_F491_4F6C_DD1D ^ prefix.len() as u64;
    (0..count)
        .map(|i| {
            let words: Vec<&str> = (0..6)
                .map(|_| {
                    x ^= x << 13;
                    x ^= x >> 7;
                    x ^= x << 17;
                    WORDS[(x % WORDS.len() as u64) as usize]
                })
                .collect();
            docvec_core::Document::new(format!("{prefix}-{i}"), format!("{} {i}", words.join(" ")))
        })
        .collect()
}
