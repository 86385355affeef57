//! Counted: a shared-ownership handle parameterized by counter policy
//! and deletion policy.
//!
//! A handle is a pointee pointer plus a pointer to a heap counter block
//! shared by every handle aliasing the same object. Cloning increments
//! the count; dropping (or `reset`) decrements it, and the handle whose
//! decrement reaches zero runs the deleter exactly once and frees the
//! block.
//!
//! The counter policy is part of the type: `Counted<T, CellCount>` and
//! `Counted<T, AtomicCount>` are unrelated types, so one allocation can
//! never be counted under two disciplines. Thread safety follows the
//! policy through the `Send`/`Sync` impls below: `CellCount` handles
//! are confined to one thread, `AtomicCount` handles may be cloned and
//! released concurrently with exactly-once destruction.

use core::any::Any;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::ptr::NonNull;

use crate::counter::{AtomicCount, CellCount, Count};

/// Deletion policy: releases a pointee when its count hits zero.
pub trait Deleter<T: ?Sized> {
    /// Destroy the pointee and release its allocation.
    ///
    /// # Safety
    /// `ptr` must be the pointer this handle family was constructed
    /// from, the object must still be alive, and nothing may touch it
    /// afterwards. Called at most once per object.
    unsafe fn destroy(ptr: NonNull<T>);
}

/// Default deleter: ordinary `Box` destruction.
pub struct BoxDeleter;

impl<T: ?Sized> Deleter<T> for BoxDeleter {
    unsafe fn destroy(ptr: NonNull<T>) {
        drop(Box::from_raw(ptr.as_ptr()));
    }
}

/// Shared-ownership handle over `T` with counter policy `C` and
/// deletion policy `D`.
pub struct Counted<T: ?Sized, C: Count = AtomicCount, D: Deleter<T> = BoxDeleter> {
    // Either both Some (owning) or both None (empty).
    ptr: Option<NonNull<T>>,
    counter: Option<NonNull<C>>,
    _deleter: PhantomData<fn() -> D>,
}

/// Handle with an atomic count; clones may cross threads.
pub type Shared<T> = Counted<T, AtomicCount>;
/// Handle with a plain count; confined to one thread by the type system.
pub type Local<T> = Counted<T, CellCount>;

// SAFETY: a handle hands out &T from any clone and any clone may run the
// deleter, so crossing threads needs T: Send + Sync; the counter block
// is mutated from every clone, so the policy itself must be shareable.
// CellCount is !Sync, which removes these impls for Local handles.
unsafe impl<T: ?Sized + Send + Sync, C: Count + Send + Sync, D: Deleter<T>> Send
    for Counted<T, C, D>
{
}
unsafe impl<T: ?Sized + Send + Sync, C: Count + Send + Sync, D: Deleter<T>> Sync
    for Counted<T, C, D>
{
}

impl<T: ?Sized, C: Count, D: Deleter<T>> Counted<T, C, D> {
    /// Handle owning nothing.
    pub const fn empty() -> Self {
        Self {
            ptr: None,
            counter: None,
            _deleter: PhantomData,
        }
    }

    /// Takes sole ownership of `value` (count = 1).
    pub fn new(value: T) -> Self
    where
        T: Sized,
    {
        Self::from_box(Box::new(value))
    }

    /// Takes sole ownership of a boxed (possibly unsized) pointee.
    pub fn from_box(boxed: Box<T>) -> Self {
        // SAFETY: Box::into_raw never returns null.
        let ptr = unsafe { NonNull::new_unchecked(Box::into_raw(boxed)) };
        let counter = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(C::one()))) };
        Self {
            ptr: Some(ptr),
            counter: Some(counter),
            _deleter: PhantomData,
        }
    }

    /// Takes sole ownership of a raw pointee (count = 1).
    ///
    /// # Safety
    /// `ptr` must be non-null, valid, and exclusively owned by the
    /// caller, and it must be releasable by `D::destroy` (for the
    /// default `BoxDeleter`: it came from `Box::into_raw`).
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        let ptr = match NonNull::new(ptr) {
            Some(p) => p,
            None => panic!("Counted::from_raw called with a null pointer"),
        };
        let counter = NonNull::new_unchecked(Box::into_raw(Box::new(C::one())));
        Self {
            ptr: Some(ptr),
            counter: Some(counter),
            _deleter: PhantomData,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Borrow the pointee, if any.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: the pointee outlives every handle referencing its
        // counter block, and we hold one.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    /// Live reference count; 0 for an empty handle.
    pub fn ref_count(&self) -> usize {
        match self.counter {
            Some(c) => unsafe { c.as_ref() }.load(),
            None => 0,
        }
    }

    /// True iff this handle is the only owner. An empty handle shares
    /// its (nonexistent) pointee with nobody and reports `true`.
    pub fn is_unique(&self) -> bool {
        match self.counter {
            Some(c) => unsafe { c.as_ref() }.load() == 1,
            None => true,
        }
    }

    /// True iff both handles alias the same object (or are both empty).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }

    /// Releases this handle's reference; the handle becomes empty.
    /// Equivalent to assigning null in pointer terms.
    pub fn reset(&mut self) {
        let (ptr, counter) = match (self.ptr.take(), self.counter.take()) {
            (Some(p), Some(c)) => (p, c),
            _ => return,
        };
        // SAFETY: the counter block is alive while any handle refers to
        // it; on the zero transition this handle is the last owner, so
        // destroying the pointee and freeing the block race with nobody.
        unsafe {
            if counter.as_ref().put() {
                D::destroy(ptr);
                drop(Box::from_raw(counter.as_ptr()));
            }
        }
    }
}

impl<T: Sized, C: Count, D: Deleter<T>> Counted<T, C, D> {
    /// Raw pointer to the pointee; null when empty.
    pub fn as_ptr(&self) -> *const T {
        match self.ptr {
            Some(p) => p.as_ptr(),
            None => core::ptr::null(),
        }
    }
}

impl<T: 'static, C: Count> Counted<T, C, BoxDeleter> {
    /// Upcast to a type-erased handle sharing the same counter block.
    pub fn into_any(self) -> Counted<dyn Any, C, BoxDeleter> {
        let mut this = ManuallyDrop::new(self);
        match (this.ptr.take(), this.counter.take()) {
            (Some(p), Some(c)) => {
                let wide: *mut dyn Any = p.as_ptr();
                Counted {
                    // SAFETY: derived from a NonNull pointer.
                    ptr: Some(unsafe { NonNull::new_unchecked(wide) }),
                    counter: Some(c),
                    _deleter: PhantomData,
                }
            }
            _ => Counted::empty(),
        }
    }
}

impl<C: Count> Counted<dyn Any, C, BoxDeleter> {
    /// Downcast back to a concrete handle. Returns the original handle
    /// unchanged when the pointee is not a `T` (or the handle is empty).
    pub fn downcast<T: 'static>(self) -> Result<Counted<T, C, BoxDeleter>, Self> {
        let is_t = self.get().map_or(false, |a| a.is::<T>());
        if !is_t {
            return Err(self);
        }
        let mut this = ManuallyDrop::new(self);
        match (this.ptr.take(), this.counter.take()) {
            (Some(p), Some(c)) => Ok(Counted {
                ptr: Some(p.cast::<T>()),
                counter: Some(c),
                _deleter: PhantomData,
            }),
            // is_t established a live pointee.
            _ => unreachable!(),
        }
    }
}

impl<T: ?Sized, C: Count, D: Deleter<T>> Clone for Counted<T, C, D> {
    fn clone(&self) -> Self {
        if let Some(c) = self.counter {
            // SAFETY: block alive while this handle exists.
            unsafe { c.as_ref() }.get();
        }
        Self {
            ptr: self.ptr,
            counter: self.counter,
            _deleter: PhantomData,
        }
    }
}

impl<T: ?Sized, C: Count, D: Deleter<T>> Drop for Counted<T, C, D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, C: Count, D: Deleter<T>> Default for Counted<T, C, D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized, C: Count, D: Deleter<T>> Deref for Counted<T, C, D> {
    type Target = T;
    /// Panics when the handle is empty; dereferencing an empty handle is
    /// a contract violation, not a recoverable condition.
    fn deref(&self) -> &T {
        match self.get() {
            Some(v) => v,
            None => panic!("dereferenced an empty Counted handle"),
        }
    }
}

impl<T: ?Sized, C: Count, D: Deleter<T>> PartialEq for Counted<T, C, D> {
    /// Identity comparison: two handles are equal iff they alias the
    /// same object (or are both empty).
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized, C: Count, D: Deleter<T>> Eq for Counted<T, C, D> {}

impl<T: ?Sized, C: Count, D: Deleter<T>> core::fmt::Debug for Counted<T, C, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Counted")
            .field("empty", &self.is_empty())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}
