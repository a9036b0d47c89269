//! Integration tests for persistent collections
//!
//! Tests structural sharing semantics of PVec and PSet.

use quill_foundation::{PSet, PVec};

#[test]
fn pvec_push_keeps_the_original() {
    let empty: PVec<i32> = PVec::new();
    let one = empty.push_back(1);
    let two = one.push_back(2);
    assert!(empty.is_empty());
    assert_eq!(one.len(), 1);
    assert_eq!(two.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(two.last(), Some(&2));
    assert_eq!(two.get(5), None);
}

#[test]
fn pvec_from_iterator() {
    let v: PVec<&str> = ["a", "b", "c"].into_iter().collect();
    assert_eq!(v.get(1), Some(&"b"));
    assert_eq!(v.into_iter().count(), 3);
}

#[test]
fn pset_insert_and_equality() {
    let base: PSet<&str> = PSet::new();
    let a = base.insert("x").insert("y");
    let b: PSet<&str> = ["y", "x", "x"].into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
    assert!(a.contains(&"x"));
    assert!(!base.contains(&"x"));
}
