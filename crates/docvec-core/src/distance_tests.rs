//! Tests for `distance` module

use super::distance::*;
use proptest::prelude::*;

#[test]
fn test_squared_euclidean_basic() {
    let a = [0.0, 0.0, 0.0];
    let b = [1.0, 2.0, 2.0];
    assert!((squared_euclidean(&a, &b) - 9.0).abs() < 1e-6);
}

#[test]
fn test_squared_euclidean_handles_simd_remainder() {
    // 11 = one full lane of 8 plus 3 scalar tail elements
    let a: Vec<f32> = (0..11).map(|i| i as f32).collect();
    let b = vec![0.0; 11];
    let expected: f32 = (0..11).map(|i| (i * i) as f32).sum();
    assert!((squared_euclidean(&a, &b) - expected).abs() < 1e-3);
}

#[test]
fn test_cosine_similarity_orthogonal_and_parallel() {
    let x = [1.0, 0.0];
    let y = [0.0, 1.0];
    let x2 = [3.0, 0.0];
    assert!(cosine_similarity(&x, &y).abs() < 1e-6);
    assert!((cosine_similarity(&x, &x2) - 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_similarity_zero_vector_scores_zero() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
}

#[test]
fn test_normalize_in_place() {
    let mut v = vec![3.0, 4.0];
    normalize_in_place(&mut v);
    assert!((v[0] - 0.6).abs() < 1e-6);
    assert!((v[1] - 0.8).abs() < 1e-6);

    let mut zero = vec![0.0; 4];
    normalize_in_place(&mut zero);
    assert!(zero.iter().all(|&x| x == 0.0));
}

#[test]
#[should_panic(expected = "Vector dimensions must match")]
fn test_squared_euclidean_length_mismatch_panics() {
    let _ = squared_euclidean(&[1.0], &[1.0, 2.0]);
}

proptest! {
    #[test]
    fn prop_squared_euclidean_is_symmetric_and_non_negative(
        pair in (1usize..40).prop_flat_map(|n| (
            prop::collection::vec(-100.0f32..100.0, n),
            prop::collection::vec(-100.0f32..100.0, n),
        ))
    ) {
        let (a, b) = pair;
        let ab = squared_euclidean(&a, &b);
        let ba = squared_euclidean(&b, &a);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() <= 1e-3 * ab.max(1.0));
        prop_assert!(squared_euclidean(&a, &a).abs() < 1e-6);
    }
}
