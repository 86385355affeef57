//! Reference-counter policies.
//!
//! A `Count` is the strategy a [`Counted`](crate::Counted) handle uses
//! for its shared reference count. Two policies exist: `CellCount`
//! (plain integer, single-threaded) and `AtomicCount` (atomic integer,
//! safe for concurrent clone/drop). Handles instantiated with different
//! policies are different types; there is no conversion between them,
//! so mixing counting disciplines on one allocation is ruled out at
//! compile time.

use core::cell::Cell;
use core::sync::atomic::{fence, AtomicUsize, Ordering};

/// A shared reference count.
///
/// `get` acquires one reference, `put` releases one and reports whether
/// the count reached zero. The caller that observes `put() == true` is
/// the unique owner of whatever the count was guarding.
pub trait Count {
    /// Fresh counter holding exactly one reference.
    fn one() -> Self;

    /// Acquire one reference.
    fn get(&self);

    /// Release one reference. Returns true iff the count is now zero.
    fn put(&self) -> bool;

    /// Observed count. For `AtomicCount` this is a snapshot that may be
    /// stale by the time the caller looks at it, except when it reads 1
    /// from the only live handle.
    fn load(&self) -> usize;
}

/// Single-threaded reference counter.
///
/// `Cell` keeps this type `!Sync`, which in turn keeps any handle built
/// on it confined to one thread (see the `Send`/`Sync` impls on
/// `Counted`). Mutation is therefore never concurrent.
#[derive(Debug)]
pub struct CellCount {
    count: Cell<usize>,
}

impl Count for CellCount {
    fn one() -> Self {
        Self {
            count: Cell::new(1),
        }
    }

    #[inline]
    fn get(&self) {
        let n = self.count.get().wrapping_add(1);
        self.count.set(n);
        if n == 0 {
            // Follow Rc semantics: abort on overflow rather than continue unsafely.
            std::process::abort();
        }
    }

    #[inline]
    fn put(&self) -> bool {
        let c = self.count.get();
        assert!(c > 0, "CellCount underflow");
        self.count.set(c - 1);
        c == 1
    }

    #[inline]
    fn load(&self) -> usize {
        self.count.get()
    }
}

// Past this point Arc would abort; leaves headroom so racing increments
// cannot wrap before the abort fires.
const MAX_REFCOUNT: usize = usize::MAX / 2;

/// Thread-safe reference counter.
///
/// Increment is `Relaxed`; decrement is `Release` with an `Acquire`
/// fence taken by the thread that drives the count to zero. That fence
/// orders every preceding release of the guarded object before its
/// destruction.
#[derive(Debug)]
pub struct AtomicCount {
    count: AtomicUsize,
}

impl Count for AtomicCount {
    fn one() -> Self {
        Self {
            count: AtomicUsize::new(1),
        }
    }

    #[inline]
    fn get(&self) {
        let old = self.count.fetch_add(1, Ordering::Relaxed);
        if old > MAX_REFCOUNT {
            std::process::abort();
        }
    }

    #[inline]
    fn put(&self) -> bool {
        if self.count.fetch_sub(1, Ordering::Release) == 1 {
            fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    #[inline]
    fn load(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}
