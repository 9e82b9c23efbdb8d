//! Tests for `vector_store` module

use super::vector_store::VectorStore;
use crate::error::Error;

#[test]
fn test_append_assigns_sequential_positions() {
    // Arrange
    let mut store = VectorStore::new(3);

    // Act
    let p0 = store.append(&[1.0, 2.0, 3.0]).expect("append");
    let p1 = store.append(&[4.0, 5.0, 6.0]).expect("append");

    // Assert
    assert_eq!(p0, 0);
    assert_eq!(p1, 1);
    assert_eq!(store.len(), 2);
    assert_eq!(store.vector(1), &[4.0, 5.0, 6.0]);
}

#[test]
fn test_append_rejects_wrong_dimension() {
    let mut store = VectorStore::new(4);

    let err = store.append(&[1.0, 2.0]).expect_err("must reject");

    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 4,
            actual: 2
        }
    ));
    assert!(store.is_empty(), "rejected vector must not be stored");
}

#[test]
fn test_get_out_of_bounds_is_none() {
    let mut store = VectorStore::new(2);
    store.append(&[0.0, 1.0]).expect("append");

    assert!(store.get(0).is_some());
    assert!(store.get(1).is_none());
    assert!(store.get(usize::MAX).is_none());
}

#[test]
fn test_iter_yields_in_position_order() {
    let mut store = VectorStore::new(2);
    for i in 0..5 {
        store.append(&[i as f32, -(i as f32)]).expect("append");
    }

    let firsts: Vec<f32> = store.iter().map(|v| v[0]).collect();

    assert_eq!(firsts, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_from_flat_rejects_ragged_buffer() {
    assert!(VectorStore::from_flat(3, vec![0.0; 7]).is_err());
    assert!(VectorStore::from_flat(0, vec![]).is_err());

    let store = VectorStore::from_flat(3, vec![0.0; 9]).expect("whole vectors");
    assert_eq!(store.len(), 3);
}

#[test]
fn test_try_reserve_overflow_is_resource_exhausted() {
    let mut store = VectorStore::new(1024);
    let err = store.try_reserve(usize::MAX).expect_err("overflow");
    assert!(matches!(err, Error::ResourceExhausted(_)));
}
