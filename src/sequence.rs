//! DynamicSequence: contiguous growable storage with an explicit growth policy.
//!
//! Unlike `Vec`, growth is driven by two tunables fixed at construction:
//! a granularity (minimum chunk the capacity grows by, and the multiple
//! it is rounded up to) and a growth percentage (relative factor applied
//! once the sequence outgrows granularity steps). Capacity only shrinks
//! on explicit `resize_capacity`/`compact`.
//!
//! Removal comes in two flavors: `remove` preserves the relative order
//! of the remaining elements (tail shift), `swap_remove` trades order
//! for O(1) by moving the last element into the hole.
//!
//! Not internally synchronized: one mutating thread at a time, arbitrary
//! concurrent readers while nothing mutates.

use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use core::slice;
use std::alloc::{alloc, dealloc, handle_alloc_error, realloc, Layout};

use bytemuck::Pod;

/// Default minimum growth chunk.
pub const DEFAULT_GRANULARITY: usize = 1;
/// Default relative growth factor, in percent.
pub const DEFAULT_GROWTH_PERCENT: usize = 50;

/// A contiguous, index-addressable, growable sequence of elements.
///
/// `len() <= capacity()` holds after every operation; reallocation
/// preserves element order. Zero-sized element types never allocate and
/// report `usize::MAX` capacity.
pub struct DynamicSequence<T> {
    ptr: NonNull<T>,
    cap: usize,
    len: usize,
    granularity: usize,
    growth_percent: usize,
}

// SAFETY: the sequence is a pointer + bookkeeping over owned elements;
// it moves between threads when its elements do.
unsafe impl<T: Send> Send for DynamicSequence<T> {}
unsafe impl<T: Sync> Sync for DynamicSequence<T> {}

impl<T> DynamicSequence<T> {
    /// Empty sequence with the default growth policy. Does not allocate.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            len: 0,
            granularity: DEFAULT_GRANULARITY,
            growth_percent: DEFAULT_GROWTH_PERCENT,
        }
    }

    /// Preallocates `cap` slots with the default growth policy.
    pub fn with_capacity(cap: usize) -> Self {
        Self::with_policy(cap, DEFAULT_GRANULARITY, DEFAULT_GROWTH_PERCENT)
    }

    /// Preallocates `cap` slots and fixes the growth policy.
    ///
    /// `granularity` is the minimum chunk the capacity grows by and the
    /// multiple every grown capacity is rounded up to. `growth_percent`
    /// is the relative factor (50 means capacity * 1.5) that takes over
    /// once it outpaces granularity steps. Panics if `granularity == 0`.
    pub fn with_policy(cap: usize, granularity: usize, growth_percent: usize) -> Self {
        assert!(granularity > 0, "granularity must be at least 1");
        let mut seq = Self {
            ptr: NonNull::dangling(),
            cap: 0,
            len: 0,
            granularity,
            growth_percent,
        };
        if cap > 0 {
            // SAFETY: len is 0, nothing to preserve.
            unsafe { seq.reallocate(cap) };
        }
        seq
    }

    /// Sequence of `n` clones of `value`.
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut seq = Self::with_capacity(n);
        for _ in 0..n {
            seq.push(value.clone());
        }
        seq
    }

    /// Bulk-copy construction for plain-old-data element types.
    pub fn from_pod_slice(src: &[T]) -> Self
    where
        T: Pod,
    {
        let mut seq = Self::with_capacity(src.len());
        seq.extend_from_pod_slice(src);
        seq
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slot count. `usize::MAX` for zero-sized element types.
    #[inline]
    pub fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.cap
        }
    }

    #[inline]
    pub fn granularity(&self) -> usize {
        self.granularity
    }

    #[inline]
    pub fn growth_percent(&self) -> usize {
        self.growth_percent
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialized.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` slots are initialized and we hold &mut.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// True iff `index` addresses a live element.
    #[inline]
    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.len
    }

    fn array_layout(cap: usize) -> Layout {
        match Layout::array::<T>(cap) {
            Ok(l) => l,
            Err(_) => panic!("sequence capacity overflow"),
        }
    }

    /// Reallocate backing storage to exactly `new_cap` slots.
    ///
    /// SAFETY: caller must ensure `self.len <= new_cap`.
    unsafe fn reallocate(&mut self, new_cap: usize) {
        debug_assert!(self.len <= new_cap);
        if mem::size_of::<T>() == 0 || new_cap == self.cap {
            return;
        }
        if new_cap == 0 {
            dealloc(self.ptr.as_ptr() as *mut u8, Self::array_layout(self.cap));
            self.ptr = NonNull::dangling();
            self.cap = 0;
            return;
        }
        let new_layout = Self::array_layout(new_cap);
        let raw = if self.cap == 0 {
            alloc(new_layout)
        } else {
            realloc(
                self.ptr.as_ptr() as *mut u8,
                Self::array_layout(self.cap),
                new_layout.size(),
            )
        };
        if raw.is_null() {
            handle_alloc_error(new_layout);
        }
        self.ptr = NonNull::new_unchecked(raw as *mut T);
        self.cap = new_cap;
    }

    /// Next capacity per the growth policy, covering at least `required`.
    fn grown_capacity(&self, required: usize) -> usize {
        let stepped = self.cap.saturating_add(self.granularity);
        let scaled = ((self.cap as u128 * (100 + self.growth_percent as u128)) / 100) as usize;
        let target = stepped.max(scaled).max(required);
        // Round up to the next granularity multiple.
        let rem = target % self.granularity;
        if rem == 0 {
            target
        } else {
            target + (self.granularity - rem)
        }
    }

    fn grow_for(&mut self, required: usize) {
        let new_cap = self.grown_capacity(required);
        // SAFETY: new_cap >= required >= len.
        unsafe { self.reallocate(new_cap) };
    }

    /// Ensures capacity for at least `cap` elements without changing
    /// `len`. Rounds the allocation up to the granularity multiple.
    pub fn reserve(&mut self, cap: usize) {
        if mem::size_of::<T>() == 0 || cap <= self.cap {
            return;
        }
        let rem = cap % self.granularity;
        let rounded = if rem == 0 {
            cap
        } else {
            cap + (self.granularity - rem)
        };
        // SAFETY: rounded >= cap > self.cap >= self.len.
        unsafe { self.reallocate(rounded) };
    }

    /// Sets capacity to exactly `cap`. Elements beyond `cap` are dropped.
    pub fn resize_capacity(&mut self, cap: usize) {
        if cap < self.len {
            self.truncate(cap);
        }
        // SAFETY: len <= cap after the truncate above.
        unsafe { self.reallocate(cap) };
    }

    /// Drops elements beyond `n` without touching capacity.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.len {
            return;
        }
        let tail = self.len - n;
        // Mark the tail dead before dropping: a panicking destructor must
        // not leave those slots reachable.
        self.len = n;
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr().add(n),
                tail,
            ));
        }
    }

    /// Shrinks capacity to exactly `len`. Idempotent.
    pub fn compact(&mut self) {
        // SAFETY: target equals len.
        unsafe { self.reallocate(self.len) };
    }

    /// Appends one element, growing per the policy when full.
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity() {
            self.grow_for(self.len + 1);
        }
        // SAFETY: slot `len` is in bounds and uninitialized.
        unsafe { ptr::write(self.ptr.as_ptr().add(self.len), value) };
        self.len += 1;
    }

    /// Appends clones of every element in `src`.
    pub fn extend_from_slice(&mut self, src: &[T])
    where
        T: Clone,
    {
        let needed = self.len + src.len();
        if needed > self.capacity() {
            self.grow_for(needed);
        }
        for v in src {
            // SAFETY: capacity was ensured above.
            unsafe { ptr::write(self.ptr.as_ptr().add(self.len), v.clone()) };
            self.len += 1;
        }
    }

    /// Bulk-copy append for plain-old-data element types.
    ///
    /// Observably equivalent to `extend_from_slice`; it only swaps the
    /// per-element clone loop for one raw memory copy.
    pub fn extend_from_pod_slice(&mut self, src: &[T])
    where
        T: Pod,
    {
        let needed = self.len + src.len();
        if needed > self.capacity() {
            self.grow_for(needed);
        }
        // SAFETY: capacity ensured; source and destination cannot overlap
        // because `src` is a shared borrow and the tail slots are dead.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.as_ptr().add(self.len), src.len());
        }
        self.len += src.len();
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the old last slot is initialized and now dead.
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Drops the last `n` elements. Panics if `n > len`.
    pub fn pop_n(&mut self, n: usize) {
        assert!(n <= self.len, "pop_n past the end of the sequence");
        self.truncate(self.len - n);
    }

    /// Inserts `value` at `index`, shifting the tail right by one.
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len, "insert index out of bounds");
        if self.len == self.capacity() {
            self.grow_for(self.len + 1);
        }
        // SAFETY: index <= len < capacity; the shift stays in bounds.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::copy(base.add(index), base.add(index + 1), self.len - index);
            ptr::write(base.add(index), value);
        }
        self.len += 1;
    }

    /// Removes the element at `index`, preserving the order of the
    /// remaining elements (O(len - index)). Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "remove index out of bounds");
        // SAFETY: index < len; the shift covers exactly the live tail.
        unsafe {
            let base = self.ptr.as_ptr();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(index + 1), base.add(index), self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Removes `n` elements starting at `index`, preserving order.
    /// Panics if the range extends past the end.
    pub fn remove_n(&mut self, index: usize, n: usize) {
        let end = match index.checked_add(n) {
            Some(e) if e <= self.len => e,
            _ => panic!("remove_n range out of bounds"),
        };
        let old_len = self.len;
        // Mark everything from `index` on dead before dropping: a
        // panicking destructor must not leave dropped slots counted
        // live (the unwind leaks the tail instead of double-dropping).
        self.len = index;
        // SAFETY: [index, end) is live; drop it, then shift the tail down.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(index), n));
            ptr::copy(base.add(end), base.add(index), old_len - end);
        }
        self.len = old_len - n;
    }

    /// Removes the element at `index` in O(1) by moving the last element
    /// into its place. Does not preserve order. Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "swap_remove index out of bounds");
        // SAFETY: both slots are live; the removed value is read out and
        // the last slot is dead after the copy.
        unsafe {
            let base = self.ptr.as_ptr();
            let value = ptr::read(base.add(index));
            let last = self.len - 1;
            if index != last {
                ptr::copy_nonoverlapping(base.add(last), base.add(index), 1);
            }
            self.len = last;
            value
        }
    }

    /// Finds the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.as_slice().iter().position(|x| x == value)
    }

    /// Reference to the first element equal to `value`.
    pub fn find(&self, value: &T) -> Option<&T>
    where
        T: PartialEq,
    {
        self.index_of(value).map(|i| &self.as_slice()[i])
    }

    /// True iff some element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// Removes the first element equal to `value`, preserving order.
    /// Returns whether a removal happened.
    pub fn remove_value(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(i) => {
                self.remove(i);
                true
            }
            None => false,
        }
    }

    /// `swap_remove` counterpart of `remove_value`. Does not preserve order.
    pub fn swap_remove_value(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            Some(i) => {
                self.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Drops every element without touching capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }
}

impl<T> Default for DynamicSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for DynamicSequence<T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynamicSequence<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone> Clone for DynamicSequence<T> {
    /// Deep copy: the clone owns independent element copies and carries
    /// the same growth policy. Capacity shrinks to the element count.
    fn clone(&self) -> Self {
        let mut out = Self::with_policy(self.len, self.granularity, self.growth_percent);
        out.extend_from_slice(self.as_slice());
        out
    }
}

impl<T: PartialEq> PartialEq for DynamicSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynamicSequence<T> {}

impl<T: core::fmt::Debug> core::fmt::Debug for DynamicSequence<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T> Extend<T> for DynamicSequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> FromIterator<T> for DynamicSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

impl<'a, T> IntoIterator for &'a DynamicSequence<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicSequence<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T> IntoIterator for DynamicSequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> {
        let end = self.len;
        IntoIter {
            seq: ManuallyDrop::new(self),
            next: 0,
            end,
            _marker: PhantomData,
        }
    }
}

/// Draining by-value iterator for [`DynamicSequence`].
pub struct IntoIter<T> {
    seq: ManuallyDrop<DynamicSequence<T>>,
    next: usize,
    end: usize,
    _marker: PhantomData<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        if self.next == self.end {
            return None;
        }
        // SAFETY: slots in [next, end) are live and read out exactly once.
        let value = unsafe { ptr::read(self.seq.ptr.as_ptr().add(self.next)) };
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.end - self.next;
        (rest, Some(rest))
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        unsafe {
            // Drop the unconsumed tail, then free storage without
            // re-dropping the elements already read out.
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.seq.ptr.as_ptr().add(self.next),
                self.end - self.next,
            ));
            self.seq.len = 0;
            ManuallyDrop::drop(&mut self.seq);
        }
    }
}

impl<T> Drop for DynamicSequence<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
            if self.cap != 0 && mem::size_of::<T>() != 0 {
                dealloc(self.ptr.as_ptr() as *mut u8, Self::array_layout(self.cap));
            }
        }
    }
}
