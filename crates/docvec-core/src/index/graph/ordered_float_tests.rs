//! Tests for `ordered_float` module.

use super::ordered_float::{Candidate, OrderedFloat};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[test]
fn test_ordered_float_ord() {
    assert_eq!(OrderedFloat(1.0).cmp(&OrderedFloat(2.0)), Ordering::Less);
    assert_eq!(OrderedFloat(3.0).cmp(&OrderedFloat(2.0)), Ordering::Greater);
    assert_eq!(OrderedFloat(2.0), OrderedFloat(2.0));
}

#[test]
fn test_ordered_float_nan_is_totally_ordered() {
    let nan = OrderedFloat(f32::NAN);
    assert_eq!(nan, nan);
    assert!(OrderedFloat(f32::INFINITY) < nan);
}

#[test]
fn test_candidate_orders_by_distance_then_position() {
    assert!(Candidate::new(0.5, 9) < Candidate::new(1.0, 3));
    assert!(Candidate::new(1.0, 3) < Candidate::new(1.0, 7));
    assert_eq!(Candidate::new(1.0, 3), Candidate::new(1.0, 3));
}

#[test]
fn test_result_heap_evicts_larger_position_on_tie() {
    let mut heap = BinaryHeap::new();
    heap.push(Candidate::new(1.0, 7));
    heap.push(Candidate::new(1.0, 3));
    heap.push(Candidate::new(0.5, 9));

    assert_eq!(heap.pop().map(|c| c.node), Some(7));
    assert_eq!(heap.pop().map(|c| c.node), Some(3));
    assert_eq!(heap.pop().map(|c| c.node), Some(9));
}

#[test]
fn test_candidate_heap_pops_nearest_first() {
    let mut heap = BinaryHeap::new();
    for (d, n) in [(2.0, 0), (0.25, 4), (0.25, 1), (1.0, 2)] {
        heap.push(Reverse(Candidate::new(d, n)));
    }

    let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|Reverse(c)| c.into_pair())).collect();

    assert_eq!(order, vec![(1, 0.25), (4, 0.25), (2, 1.0), (0, 2.0)]);
}
