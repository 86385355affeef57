//! corekit: the systems-foundation layer of an engine runtime —
//! growable sequences, an open-addressed hash map, counted ownership
//! handles, and a worker task pool.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the four foundation pieces small, separately verifiable,
//!   and explicit about their invariants (growth policy, probe
//!   termination, counting discipline, idle barrier).
//! - Layers:
//!   - DynamicSequence<T>: contiguous growable storage with a
//!     granularity + growth-percentage policy; ordered and O(1)
//!     swap removal; a raw bulk-copy path for POD element types.
//!   - HashMap<K, V, S>: open addressing over a power-of-two bucket
//!     array with tombstones and stored 64-bit hashes; opaque `Cursor`
//!     positions instead of exposed bucket indices.
//!   - Count / Counted<T, C, D>: a reference-count policy trait
//!     (`CellCount` plain, `AtomicCount` atomic) under a shared
//!     ownership handle with a pluggable deleter; policies are distinct
//!     types, so counting disciplines cannot mix on one allocation.
//!   - TaskPool: fixed worker threads draining one mutex-guarded
//!     DynamicSequence FIFO, with a blocking wait-until-idle barrier.
//!
//! Constraints
//! - DynamicSequence and HashMap are not internally synchronized: one
//!   mutator at a time, concurrent readers only while nothing mutates.
//! - The task queue and the atomic counter are the only synchronized
//!   state in the crate.
//! - Contract violations (bad index, non-power-of-two map resize,
//!   stale cursor, dereferencing an empty handle) panic; ordinary
//!   absence is `Option`/`Result`, never a panic.
//! - Allocation failure is fatal (`handle_alloc_error`); there is no
//!   fallible-allocation surface.
//!
//! Notes and non-goals
//! - No weak handles; no task cancellation; no timeouts on the blocking
//!   waits; no internal locking for the plain containers.
//! - `K: Hash` runs once per key at insert; resize replays stored
//!   hashes and never calls back into user code.
//! - Unsafe code is confined to the storage internals of
//!   `sequence`/`counted` and annotated with its obligations.

mod counted;
mod counter;
mod hash_map;
mod sequence;
mod task_pool;

mod hash_map_proptest;
mod sequence_proptest;

// Public surface
pub use counted::{BoxDeleter, Counted, Deleter, Local, Shared};
pub use counter::{AtomicCount, CellCount, Count};
pub use hash_map::{
    Cursor, HashMap, InsertError, Iter, IterMut, DEFAULT_MAX_LOAD_PERCENT, MIN_BUCKETS,
};
pub use sequence::{DynamicSequence, IntoIter, DEFAULT_GRANULARITY, DEFAULT_GROWTH_PERCENT};
pub use task_pool::{Runnable, Submitter, TaskHandle, TaskPool};
