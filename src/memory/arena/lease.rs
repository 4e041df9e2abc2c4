/*!
 * Buffer Lease
 *
 * The physical storage behind every `RentedBuffer`, plus the ownership count
 * that decides when it goes back to its bucket. The `Arc` around a lease keeps
 * the memory alive; `refs` decides reuse. A lease parked in a bucket queue is
 * alive but owned by nobody.
 */

use super::bucket::Bucket;
use crate::core::errors::{invariant_violation, PoolError};
use crate::core::limits::SINGLE_OWNER;
use std::ptr::{self, NonNull};
use std::sync::atomic::{self, AtomicIsize, Ordering};
use std::sync::{Arc, Weak};

pub(crate) struct Lease {
    ptr: NonNull<u8>,
    len: usize,
    refs: AtomicIsize,
    /// `None` for unpooled and adopted buffers
    bucket: Option<Weak<Bucket>>,
}

// Access to the bytes is gated by `refs`, see RentedBuffer
unsafe impl Send for Lease {}
unsafe impl Sync for Lease {}

impl Lease {
    pub(crate) fn new(storage: Box<[u8]>, bucket: Option<Weak<Bucket>>) -> Arc<Self> {
        let len = storage.len();
        let ptr = NonNull::from(Box::leak(storage)).cast::<u8>();
        Arc::new(Self {
            ptr,
            len,
            refs: AtomicIsize::new(SINGLE_OWNER),
            bucket,
        })
    }

    /// Zeroed storage of `len` bytes
    pub(crate) fn zeroed(len: usize, bucket: Option<Weak<Bucket>>) -> Arc<Self> {
        Self::new(vec![0u8; len].into_boxed_slice(), bucket)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn refs(&self) -> isize {
        self.refs.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_pooled(&self) -> bool {
        self.bucket.is_some()
    }

    /// # Safety
    /// No `&mut` to the storage may be live.
    #[inline]
    pub(crate) unsafe fn bytes(&self) -> &[u8] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }

    /// # Safety
    /// The caller must be the only one touching the storage for the
    /// lifetime of the returned slice.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub(crate) unsafe fn bytes_mut(&self) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len)
    }

    /// Add an owner unless the lease was already fully returned
    ///
    /// Returns the observed count on failure.
    pub(crate) fn increment(&self) -> Result<(), isize> {
        let mut current = self.refs.load(Ordering::Relaxed);
        loop {
            if current <= 0 {
                return Err(current);
            }
            match self.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    /// Non-throwing share check for racy callers
    #[inline]
    pub(crate) fn try_increment(&self) -> bool {
        self.increment().is_ok()
    }

    /// Drop one owner; returns the remaining count
    ///
    /// # Panics
    /// Panics when the count was already zero or below.
    pub(crate) fn decrement(&self) -> isize {
        let previous = self.refs.fetch_sub(1, Ordering::Release);
        if previous <= 0 {
            invariant_violation(PoolError::OverRelease {
                refs: previous - 1,
            });
        }
        if previous == SINGLE_OWNER {
            // Every owner's writes happen-before the next rental
            atomic::fence(Ordering::Acquire);
        }
        previous - 1
    }

    /// Restore the single-owner count on a lease taken from a bucket queue
    #[inline]
    pub(crate) fn reset(&self) {
        self.refs.store(SINGLE_OWNER, Ordering::Relaxed);
    }

    /// Release one owner's share; the last one returns the lease to its bucket
    pub(crate) fn release(this: Arc<Self>) {
        if this.decrement() != 0 {
            return;
        }

        if let Some(bucket) = this.bucket.as_ref().and_then(Weak::upgrade) {
            bucket.recycle(this);
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let raw = ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
        drop(unsafe { Box::from_raw(raw) });
    }
}
