// Counted handle suite (consolidated).
//
// Core invariants exercised:
// - Liveness: the pointee is alive while any handle referencing its
//   counter block is alive, and destroyed exactly once at zero.
// - Uniqueness: is_unique() is true iff the count is exactly 1 (and
//   for the empty handle, by decision).
// - Policy typing: CellCount handles never cross threads; AtomicCount
//   handles tolerate concurrent clone/release from many threads.

use corekit::{Counted, Local, Shared};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Test: the canonical uniqueness life cycle.
// Verifies: fresh -> unique; one copy -> both non-unique; reset one ->
// survivor unique again.
#[test]
fn uniqueness_life_cycle() {
    let a: Shared<String> = Shared::new("owned".to_string());
    assert!(a.is_unique());

    let mut b = a.clone();
    assert!(!a.is_unique());
    assert!(!b.is_unique());
    assert_eq!(a.ref_count(), 2);

    b.reset();
    assert!(a.is_unique());
    assert!(b.is_empty());
    assert_eq!(&*a, "owned");
}

// Test: handles are identity-compared, not value-compared.
#[test]
fn identity_comparison() {
    let a: Local<i32> = Local::new(1);
    let b: Local<i32> = Local::new(1);
    let c = a.clone();
    assert_ne!(a, b); // same value, different objects
    assert_eq!(a, c);
    assert!(a.ptr_eq(&c));
    assert!(!a.ptr_eq(&b));
}

// Test: handles stored inside containers keep their pointees alive.
// Verifies: dropping the container releases each stored reference.
#[test]
fn handles_inside_containers() {
    use corekit::DynamicSequence;

    struct Tally(Arc<AtomicUsize>);
    impl Drop for Tally {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let original: Shared<Tally> = Shared::new(Tally(Arc::clone(&drops)));

    let mut seq: DynamicSequence<Shared<Tally>> = DynamicSequence::new();
    for _ in 0..5 {
        seq.push(original.clone());
    }
    assert_eq!(original.ref_count(), 6);

    drop(seq);
    assert_eq!(original.ref_count(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(original);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

// Test: concurrent clone/release storm.
// Assumes: AtomicCount handles are Send + Sync when the pointee is.
// Verifies: exactly one deleter invocation, observed via a drop tally.
#[test]
fn concurrent_release_exactly_one_deletion() {
    struct Tally(Arc<AtomicUsize>);
    impl Drop for Tally {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    for _ in 0..20 {
        let drops = Arc::new(AtomicUsize::new(0));
        let handle: Shared<Tally> = Shared::new(Tally(Arc::clone(&drops)));
        let mut joins = Vec::new();
        for _ in 0..4 {
            let h = handle.clone();
            joins.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    drop(h.clone());
                }
                drop(h);
            }));
        }
        drop(handle);
        for j in joins {
            j.join().unwrap();
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}

// Test: type-erased round trip through dyn Any.
// Verifies: the counter block is carried across the casts; downcast to
// the wrong type hands the handle back.
#[test]
fn any_cast_round_trip() {
    let concrete: Shared<u64> = Shared::new(42);
    let copy = concrete.clone();

    let erased = concrete.into_any();
    assert_eq!(erased.ref_count(), 2);
    let erased = erased.downcast::<String>().unwrap_err();
    let back = erased.downcast::<u64>().unwrap();
    assert_eq!(*back, 42);

    drop(copy);
    assert!(back.is_unique());
}

// Test: empty handles across the API.
#[test]
fn empty_handle_behaviors() {
    let e: Shared<Vec<u8>> = Counted::empty();
    assert!(e.is_empty());
    assert!(e.is_unique());
    assert_eq!(e.ref_count(), 0);
    assert!(e.get().is_none());
    // Cloning an empty handle is a no-op clone.
    let f = e.clone();
    assert!(f.is_empty());
    assert!(e.ptr_eq(&f));
}
