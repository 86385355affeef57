// DynamicSequence public-surface suite (consolidated).
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Capacity law: len() <= capacity() after every operation.
// - Growth law: on overflow, the new capacity is
//   max(cap + granularity, cap * (100 + growth%) / 100) rounded up to
//   a granularity multiple.
// - Order: ordered removal preserves relative order; swap_remove is
//   O(1) and explicitly does not.
// - Deep copy: clones and their originals never alias element data.

use corekit::DynamicSequence;

// Test: the worked growth scenario from the capacity policy.
// Assumes: with_policy preallocates exactly the requested capacity.
// Verifies: (16, granularity 8, growth 50%) + 17 pushes -> capacity 24,
// then compact() -> capacity 17.
#[test]
fn growth_scenario_sixteen_by_eight() {
    let mut s = DynamicSequence::with_policy(16, 8, 50);
    for i in 0..17 {
        s.push(i);
    }
    assert_eq!(s.len(), 17);
    assert_eq!(s.capacity(), 24);
    s.compact();
    assert_eq!(s.capacity(), 17);
    assert_eq!(s.len(), 17);
}

// Test: granularity dominates when the percentage step is smaller.
// Verifies: a tiny sequence with large granularity grows by whole
// chunks, never by fractional steps.
#[test]
fn granularity_floor_growth() {
    let mut s = DynamicSequence::with_policy(0, 16, 10);
    s.push(1u8);
    assert_eq!(s.capacity(), 16);
    for i in 0..16 {
        s.push(i);
    }
    // 16 * 1.10 = 17.6 -> 17; 16 + 16 = 32 wins; already a multiple.
    assert_eq!(s.capacity(), 32);
}

// Test: push/pop round trip across a growth boundary.
// Verifies: element order is preserved by reallocation.
#[test]
fn order_preserved_across_growth() {
    let mut s = DynamicSequence::with_policy(2, 1, 50);
    for i in 0..100 {
        s.push(i);
    }
    let collected: Vec<i32> = s.iter().copied().collect();
    let expected: Vec<i32> = (0..100).collect();
    assert_eq!(collected, expected);
    for i in (0..100).rev() {
        assert_eq!(s.pop(), Some(i));
    }
    assert_eq!(s.pop(), None);
}

// Test: the two removal flavors on the same starting state.
// Verifies: remove() shifts the tail, swap_remove() moves the last
// element into the hole; both shrink len by one.
#[test]
fn removal_flavors_contrast() {
    let base: DynamicSequence<i32> = (0..5).collect();

    let mut ordered = base.clone();
    assert_eq!(ordered.remove(1), 1);
    assert_eq!(ordered.as_slice(), &[0, 2, 3, 4]);

    let mut fast = base.clone();
    assert_eq!(fast.swap_remove(1), 1);
    assert_eq!(fast.as_slice(), &[0, 4, 2, 3]);

    // Same multiset either way.
    let mut a: Vec<i32> = ordered.iter().copied().collect();
    let mut b: Vec<i32> = fast.iter().copied().collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

// Test: trim/compact interplay.
// Verifies: truncate never reallocates; compact shrinks to len and is
// idempotent.
#[test]
fn trim_then_compact() {
    let mut s: DynamicSequence<i32> = (0..50).collect();
    let cap = s.capacity();
    s.truncate(10);
    assert_eq!(s.capacity(), cap);
    s.compact();
    assert_eq!(s.capacity(), 10);
    s.compact();
    assert_eq!(s.capacity(), 10);
}

// Test: deep copy independence in both directions.
#[test]
fn clone_isolation_both_ways() {
    let mut a: DynamicSequence<Vec<i32>> = DynamicSequence::new();
    a.push(vec![1, 2]);
    a.push(vec![3]);
    let mut b = a.clone();

    a[0].push(99);
    b.push(vec![4]);

    assert_eq!(a.as_slice(), &[vec![1, 2, 99], vec![3]]);
    assert_eq!(b.as_slice(), &[vec![1, 2], vec![3], vec![4]]);
}

// Test: search helpers agree with each other.
#[test]
fn search_helpers_parity() {
    let mut s = DynamicSequence::new();
    s.extend_from_slice(&["a", "b", "c"]);
    for (i, k) in ["a", "b", "c"].iter().enumerate() {
        assert_eq!(s.index_of(k), Some(i));
        assert_eq!(s.find(k), Some(k));
        assert!(s.contains(k));
    }
    assert_eq!(s.index_of(&"z"), None);
    assert_eq!(s.find(&"z"), None);
    assert!(!s.contains(&"z"));
}

// Test: sequence of sequences, exercising non-trivial element drops
// through every removal path.
#[test]
fn nested_sequences() {
    let mut outer: DynamicSequence<DynamicSequence<i32>> = DynamicSequence::new();
    for i in 0..4 {
        outer.push((0..i).collect());
    }
    assert_eq!(outer[3].len(), 3);
    let taken = outer.remove(2);
    assert_eq!(taken.as_slice(), &[0, 1]);
    outer.truncate(1);
    assert_eq!(outer.len(), 1);
    assert!(outer[0].is_empty());
}

// Test: extend/from_iterator interop with std iterators.
#[test]
fn iterator_interop() {
    let mut s: DynamicSequence<i32> = (0..5).collect();
    s.extend(5..8);
    assert_eq!(s.len(), 8);
    let doubled: Vec<i32> = s.into_iter().map(|v| v * 2).collect();
    assert_eq!(doubled, vec![0, 2, 4, 6, 8, 10, 12, 14]);
}
