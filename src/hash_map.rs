//! Open-addressed hash map with power-of-two bucket storage.
//!
//! All pairs live directly in the bucket array (no per-bucket chains).
//! Collisions resolve by linear probing; removals leave tombstones so
//! later probe sequences still terminate correctly. Each entry stores
//! its 64-bit hash, so `K: Hash` runs exactly once per key and is never
//! re-invoked during resize.
//!
//! Structural invariants, checked by asserts at the mutation boundaries:
//! - the bucket count is a power of two, at least [`MIN_BUCKETS`];
//! - the bucket count is strictly greater than the live pair count;
//! - `count + tombstones` stays below the load threshold, so every
//!   probe sequence reaches an empty bucket.
//!
//! Not internally synchronized; external locking is the caller's job.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::slice;
use std::collections::hash_map::RandomState;

use thiserror::Error;

/// Smallest bucket array ever allocated. Keeps `capacity > len` true
/// for an empty map without a special case.
pub const MIN_BUCKETS: usize = 8;

/// Occupancy threshold (percent of buckets counting tombstones) that
/// triggers a rehash on insert.
pub const DEFAULT_MAX_LOAD_PERCENT: usize = 70;

/// Rejection returned by [`HashMap::insert`] for an already-present key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InsertError {
    #[error("key already present")]
    DuplicateKey,
}

enum Slot<K, V> {
    Empty,
    Tombstone,
    Occupied(Bucket<K, V>),
}

struct Bucket<K, V> {
    hash: u64,
    key: K,
    value: V,
}

/// Opaque position of an occupied bucket, produced by [`HashMap::find`].
///
/// A cursor is only meaningful against the map that produced it and is
/// invalidated by any mutation of that map (insert, remove, resize,
/// compact, clear). Using a stale cursor is a contract violation and
/// panics.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor(usize);

/// Open-addressed associative container.
pub struct HashMap<K, V, S = RandomState> {
    slots: Box<[Slot<K, V>]>,
    count: usize,
    tombstones: usize,
    max_load_percent: usize,
    hasher: S,
}

impl<K, V> HashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with [`MIN_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(MIN_BUCKETS, RandomState::default())
    }

    /// Pre-sized map; `cap` is rounded up to a power of two (min 8).
    pub fn with_capacity(cap: usize) -> Self {
        Self::with_capacity_and_hasher(cap, RandomState::default())
    }
}

impl<K, V> Default for HashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

fn alloc_slots<K, V>(n: usize) -> Box<[Slot<K, V>]> {
    debug_assert!(n.is_power_of_two());
    (0..n).map(|_| Slot::Empty).collect()
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(MIN_BUCKETS, hasher)
    }

    pub fn with_capacity_and_hasher(cap: usize, hasher: S) -> Self {
        let cap = cap.next_power_of_two().max(MIN_BUCKETS);
        Self {
            slots: alloc_slots(cap),
            count: 0,
            tombstones: 0,
            max_load_percent: DEFAULT_MAX_LOAD_PERCENT,
            hasher,
        }
    }

    /// Live pair count.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bucket count. Always a power of two strictly greater than `len`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn max_load_percent(&self) -> usize {
        self.max_load_percent
    }

    /// Sets the occupancy threshold that triggers growth on insert.
    /// Panics outside `1..=90`; staying below 100 is what guarantees
    /// probe termination.
    pub fn set_max_load_percent(&mut self, percent: usize) {
        assert!(
            (1..=90).contains(&percent),
            "max load percent must be in 1..=90"
        );
        self.max_load_percent = percent;
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Probe for the bucket holding `q`. Stops at the first empty slot;
    /// tombstones are skipped.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mask = self.mask();
        let mut i = (hash as usize) & mask;
        loop {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Occupied(b) if b.hash == hash && b.key.borrow() == q => return Some(i),
                _ => {}
            }
            i = (i + 1) & mask;
        }
    }

    fn grow_if_needed(&mut self) {
        let used = self.count + self.tombstones + 1;
        if used * 100 <= self.capacity() * self.max_load_percent {
            return;
        }
        // Rehash in place when tombstones alone pushed us over the
        // threshold; double otherwise.
        let target = if (self.count + 1) * 100 <= self.capacity() * self.max_load_percent {
            self.capacity()
        } else {
            self.capacity() * 2
        };
        self.rehash(target);
    }

    /// Rebuild the bucket array at `new_cap`, replaying stored hashes.
    fn rehash(&mut self, new_cap: usize) {
        debug_assert!(new_cap.is_power_of_two() && new_cap > self.count);
        let old = mem::replace(&mut self.slots, alloc_slots(new_cap));
        self.tombstones = 0;
        let mask = new_cap - 1;
        for slot in Vec::from(old) {
            if let Slot::Occupied(b) = slot {
                let mut i = (b.hash as usize) & mask;
                while matches!(self.slots[i], Slot::Occupied(_)) {
                    i = (i + 1) & mask;
                }
                self.slots[i] = Slot::Occupied(b);
            }
        }
    }

    /// Inserts `key -> value`. Fails without modifying the map when the
    /// key is already present. May grow (doubling) when the occupancy
    /// threshold is crossed.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let hash = self.make_hash(&key);
        if self.probe(hash, &key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.grow_if_needed();
        let mask = self.mask();
        let mut i = (hash as usize) & mask;
        loop {
            match self.slots[i] {
                Slot::Occupied(_) => i = (i + 1) & mask,
                Slot::Tombstone => {
                    self.tombstones -= 1;
                    self.slots[i] = Slot::Occupied(Bucket { hash, key, value });
                    self.count += 1;
                    return Ok(());
                }
                Slot::Empty => {
                    self.slots[i] = Slot::Occupied(Bucket { hash, key, value });
                    self.count += 1;
                    return Ok(());
                }
            }
        }
    }

    /// Position of the pair keyed by `q`, if present.
    pub fn find<Q>(&self, q: &Q) -> Option<Cursor>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.probe(hash, q).map(Cursor)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let c = self.find(q)?;
        match &mut self.slots[c.0] {
            Slot::Occupied(b) => Some(&mut b.value),
            _ => None,
        }
    }

    /// The stored `(key, value)` pair for `q`, if present.
    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let c = self.find(q)?;
        match &self.slots[c.0] {
            Slot::Occupied(b) => Some((&b.key, &b.value)),
            _ => None,
        }
    }

    /// True iff `cursor` addresses an occupied bucket of this map.
    pub fn is_valid(&self, cursor: Cursor) -> bool {
        cursor.0 < self.slots.len() && matches!(self.slots[cursor.0], Slot::Occupied(_))
    }

    fn occupied(&self, cursor: Cursor) -> &Bucket<K, V> {
        match &self.slots[cursor.0] {
            Slot::Occupied(b) => b,
            _ => panic!("cursor does not address an occupied bucket"),
        }
    }

    /// Key at `cursor`. Panics on a stale or foreign cursor.
    pub fn key_at(&self, cursor: Cursor) -> &K {
        &self.occupied(cursor).key
    }

    /// Value at `cursor`. Panics on a stale or foreign cursor.
    pub fn value_at(&self, cursor: Cursor) -> &V {
        &self.occupied(cursor).value
    }

    pub fn value_at_mut(&mut self, cursor: Cursor) -> &mut V {
        match &mut self.slots[cursor.0] {
            Slot::Occupied(b) => &mut b.value,
            _ => panic!("cursor does not address an occupied bucket"),
        }
    }

    /// Removes the pair at `cursor`, returning it. Panics on a stale or
    /// foreign cursor.
    pub fn remove_at(&mut self, cursor: Cursor) -> (K, V) {
        match mem::replace(&mut self.slots[cursor.0], Slot::Tombstone) {
            Slot::Occupied(b) => {
                self.count -= 1;
                self.tombstones += 1;
                (b.key, b.value)
            }
            other => {
                self.slots[cursor.0] = other;
                panic!("cursor does not address an occupied bucket");
            }
        }
    }

    /// Removes the pair keyed by `q` if present; no-op otherwise.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let c = self.find(q)?;
        Some(self.remove_at(c).1)
    }

    /// Rebuilds the bucket array at exactly `new_cap` buckets.
    ///
    /// `new_cap` must be a power of two, at least [`MIN_BUCKETS`], and
    /// strictly greater than `len()`; violating any of these is a
    /// contract failure and panics.
    pub fn resize(&mut self, new_cap: usize) {
        assert!(
            new_cap.is_power_of_two(),
            "hash map capacity must be a power of two"
        );
        assert!(
            new_cap >= MIN_BUCKETS,
            "hash map capacity must be at least {MIN_BUCKETS} buckets"
        );
        assert!(
            new_cap > self.count,
            "hash map capacity must exceed the pair count"
        );
        self.rehash(new_cap);
    }

    /// Shrinks storage to the smallest legal power of two (> `len()`,
    /// min [`MIN_BUCKETS`]). May sit above the load threshold until the
    /// next insert grows it again.
    pub fn compact(&mut self) {
        let mut target = self.count.next_power_of_two().max(MIN_BUCKETS);
        if target <= self.count {
            target *= 2;
        }
        self.rehash(target);
    }

    /// Drops every pair; bucket storage is kept.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.count = 0;
        self.tombstones = 0;
    }

    /// Iterates occupied buckets in storage order. Every live pair is
    /// visited exactly once; the order has nothing to do with insertion
    /// order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.slots.iter_mut(),
        }
    }
}

impl<K, V, S> core::fmt::Debug for HashMap<K, V, S>
where
    K: Eq + Hash + core::fmt::Debug,
    V: core::fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &V)` pairs of a [`HashMap`].
pub struct Iter<'a, K, V> {
    inner: slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.inner.by_ref() {
            if let Slot::Occupied(b) = slot {
                return Some((&b.key, &b.value));
            }
        }
        None
    }
}

/// Iterator over `(&K, &mut V)` pairs of a [`HashMap`].
pub struct IterMut<'a, K, V> {
    inner: slice::IterMut<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.inner.by_ref() {
            if let Slot::Occupied(b) = slot {
                return Some((&b.key, &mut b.value));
            }
        }
        None
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
