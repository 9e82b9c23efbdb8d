//! Tests for `embedding` module

use crate::distance::{cosine_similarity, dot};
use crate::embedding::{EmbeddingProvider, HashingEmbedder};

#[test]
fn test_hashing_embedder_dimension_and_norm() {
    // Arrange
    let embedder = HashingEmbedder::new(64);

    // Act
    let v = embedder.encode("The quick brown fox").expect("encode");

    // Assert
    assert_eq!(v.len(), 64);
    assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
}

#[test]
fn test_hashing_embedder_is_deterministic_and_case_insensitive() {
    let embedder = HashingEmbedder::default();

    let a = embedder.encode("Cats are Mammals").expect("encode");
    let b = embedder.encode("cats are mammals").expect("encode");

    assert_eq!(a, b);
}

#[test]
fn test_shared_words_score_higher_than_unrelated_text() {
    let embedder = HashingEmbedder::default();

    let base = embedder.encode("cats are mammals").expect("encode");
    let related = embedder.encode("dogs are mammals").expect("encode");
    let unrelated = embedder.encode("stocks rose today").expect("encode");

    assert!(cosine_similarity(&base, &related) > cosine_similarity(&base, &unrelated));
}

#[test]
fn test_punctuation_only_text_yields_zero_vector() {
    let embedder = HashingEmbedder::new(16);

    let v = embedder.encode("?!  ...").expect("encode");

    assert!(v.iter().all(|&x| x == 0.0));
}

#[test]
fn test_zero_dimension_is_clamped() {
    assert_eq!(HashingEmbedder::new(0).dimension(), 1);
}
