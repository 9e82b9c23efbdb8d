//! Tests for `layer` module.

use super::layer::{Layer, NodeId};

#[test]
fn test_layer_new_empty() {
    let layer = Layer::new();
    assert_eq!(layer.neighbors(0), &[] as &[NodeId]);
}

#[test]
fn test_layer_set_and_get_neighbors() {
    let mut layer = Layer::new();
    layer.ensure_capacity(4);

    layer.set_neighbors(2, vec![0, 1, 4]);

    assert_eq!(layer.neighbors(2), &[0, 1, 4]);
    assert!(layer.neighbors(3).is_empty());
}

#[test]
fn test_set_neighbors_without_slot_is_ignored() {
    let mut layer = Layer::new();
    layer.set_neighbors(5, vec![1]);
    assert!(layer.neighbors(5).is_empty());
}

#[test]
fn test_try_reserve_then_ensure_capacity() {
    let mut layer = Layer::new();
    layer.try_reserve_for(9).expect("reserve");
    layer.ensure_capacity(9);
    assert!(layer.neighbors_mut(9).is_some());
    assert!(layer.neighbors_mut(10).is_none());
}
