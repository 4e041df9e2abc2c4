/*!
 * Fast-Path Slot
 * Single cached instance exchanged atomically, bypassing the queue
 */

use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// One atomically exchanged `Box<T>`
///
/// Holds a leaked box while occupied, so installing and taking an instance
/// never allocates.
pub(crate) struct FastSlot<T> {
    ptr: AtomicPtr<T>,
    _owns: PhantomData<Box<T>>,
}

// The slot hands ownership across threads, never shares it
unsafe impl<T: Send> Send for FastSlot<T> {}
unsafe impl<T: Send> Sync for FastSlot<T> {}

impl<T> FastSlot<T> {
    pub(crate) const fn new() -> Self {
        Self {
            ptr: AtomicPtr::new(ptr::null_mut()),
            _owns: PhantomData,
        }
    }

    /// Take the cached instance, if any
    #[inline]
    pub(crate) fn take(&self) -> Option<Box<T>> {
        // Skip the exclusive cache-line access when the slot is obviously empty
        if self.ptr.load(Ordering::Relaxed).is_null() {
            return None;
        }

        let raw = self.ptr.swap(ptr::null_mut(), Ordering::Acquire);
        if raw.is_null() {
            None
        } else {
            Some(unsafe { Box::from_raw(raw) })
        }
    }

    /// Install an instance if the slot is empty
    ///
    /// Returns the instance back when the slot is occupied.
    #[inline]
    pub(crate) fn try_put(&self, item: Box<T>) -> Result<(), Box<T>> {
        if !self.ptr.load(Ordering::Relaxed).is_null() {
            return Err(item);
        }

        let raw = Box::into_raw(item);
        match self.ptr.compare_exchange(
            ptr::null_mut(),
            raw,
            Ordering::Release,
            Ordering::Relaxed,
        ) {
            Ok(_) => Ok(()),
            Err(_) => Err(unsafe { Box::from_raw(raw) }),
        }
    }

    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        !self.ptr.load(Ordering::Relaxed).is_null()
    }
}

impl<T> Drop for FastSlot<T> {
    fn drop(&mut self) {
        drop(self.take());
    }
}
