/*!
 * Rented Buffer
 *
 * Reference-counted owner of one physical buffer. Every `RentedBuffer` value
 * holds exactly one count; sharing creates another value, releasing (or
 * dropping) gives one back. The storage goes home to its bucket when the
 * last count is released.
 *
 * # Mutation
 *
 * Mutable access is granted while this handle is the only owner. Bytes
 * written before sharing are visible through every share; nothing is copied.
 * Callers that need shared writers synchronize them and use
 * [`RentedBuffer::as_mut_slice_unchecked`].
 */

use super::lease::Lease;
use super::shared::SharedSlice;
use super::view::{BufferView, BufferViewMut};
use crate::core::errors::{check_range, invariant_violation, PoolError};
use crate::core::limits::SINGLE_OWNER;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::Arc;

/// Handle to a rented (or adopted) byte buffer
pub struct RentedBuffer {
    lease: ManuallyDrop<Arc<Lease>>,
}

impl RentedBuffer {
    #[inline]
    pub(crate) fn from_lease(lease: Arc<Lease>) -> Self {
        Self {
            lease: ManuallyDrop::new(lease),
        }
    }

    /// Zero-length handle; never pooled, never allocates a byte buffer
    pub fn empty() -> Self {
        Self::from_lease(Lease::new(Box::default(), None))
    }

    /// Wrap a buffer allocated elsewhere
    ///
    /// Adopted buffers have no bucket: releasing the last owner frees them.
    pub fn adopt(buffer: Vec<u8>) -> Self {
        Self::from_lease(Lease::new(buffer.into_boxed_slice(), None))
    }

    /// Zeroed buffer of exactly `len` bytes that is never pooled
    pub(crate) fn unpooled(len: usize) -> Self {
        Self::from_lease(Lease::zeroed(len, None))
    }

    /// Length of the physical buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.lease.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer goes back to a bucket on last release
    #[inline]
    pub fn is_pooled(&self) -> bool {
        self.lease.is_pooled()
    }

    /// Current number of owners
    #[inline]
    pub fn ref_count(&self) -> isize {
        self.lease.refs()
    }

    /// Whether this handle is the only owner
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.lease.refs() == SINGLE_OWNER
    }

    /// Whether two handles alias the same physical buffer
    #[inline]
    pub fn ptr_eq(&self, other: &RentedBuffer) -> bool {
        Arc::ptr_eq(&self.lease, &other.lease)
    }

    /// Read the whole buffer
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { self.lease.bytes() }
    }

    /// Mutable access while this handle is the only owner
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut [u8]> {
        if self.is_unique() {
            Some(unsafe { self.lease.bytes_mut() })
        } else {
            None
        }
    }

    /// Mutable access regardless of sharing
    ///
    /// # Safety
    /// No other reference to the bytes (through this or any other handle or
    /// view of the same buffer) may be used while the returned slice is live.
    /// Writers sharing a buffer across threads must synchronize externally.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub unsafe fn as_mut_slice_unchecked(&self) -> &mut [u8] {
        self.lease.bytes_mut()
    }

    #[inline]
    #[track_caller]
    fn unique_bytes_mut(&mut self) -> &mut [u8] {
        let refs = self.ref_count();
        match self.get_mut() {
            Some(bytes) => bytes,
            None => invariant_violation(PoolError::SharedMutation { refs }),
        }
    }

    /// Add an owner and return a handle aliasing the same buffer
    ///
    /// # Panics
    /// Panics if the buffer was already fully returned.
    #[track_caller]
    pub fn increment_and_share(&self) -> RentedBuffer {
        match self.lease.increment() {
            Ok(()) => Self::from_lease(Arc::clone(&self.lease)),
            Err(refs) => invariant_violation(PoolError::UseAfterReturn { refs }),
        }
    }

    /// Add an owner unless the buffer was already fully returned
    ///
    /// `None` is the non-panicking answer for racing release/share calls.
    pub fn try_increment(&self) -> Option<RentedBuffer> {
        if self.lease.try_increment() {
            Some(Self::from_lease(Arc::clone(&self.lease)))
        } else {
            None
        }
    }

    /// Give this handle's count back
    ///
    /// The buffer returns to its bucket when this was the last owner.
    /// Dropping the handle does the same.
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Read-only view of the whole buffer
    #[inline]
    pub fn as_view(&self) -> BufferView<'_> {
        BufferView::new(self.as_slice(), 0)
    }

    /// Read-only view from `start` to the end
    #[track_caller]
    pub fn as_view_at(&self, start: usize) -> BufferView<'_> {
        self.as_view().slice(start)
    }

    /// Read-only view of `len` bytes from `start`
    #[track_caller]
    pub fn as_view_range(&self, start: usize, len: usize) -> BufferView<'_> {
        self.as_view().slice_range(start, len)
    }

    /// Mutable view of the whole buffer
    ///
    /// # Panics
    /// Panics if the buffer is shared.
    #[track_caller]
    pub fn as_view_mut(&mut self) -> BufferViewMut<'_> {
        BufferViewMut::new(self.unique_bytes_mut(), 0)
    }

    /// Mutable view from `start` to the end
    #[track_caller]
    pub fn as_view_mut_at(&mut self, start: usize) -> BufferViewMut<'_> {
        self.as_view_mut().slice(start)
    }

    /// Mutable view of `len` bytes from `start`
    #[track_caller]
    pub fn as_view_mut_range(&mut self, start: usize, len: usize) -> BufferViewMut<'_> {
        self.as_view_mut().slice_range(start, len)
    }

    /// Owned view with its own count, independent of this handle's lifetime
    #[track_caller]
    pub fn share_slice(&self, start: usize, len: usize) -> SharedSlice {
        check_range(start, len, self.len());
        SharedSlice::from_parts(self.increment_and_share(), start, len)
    }

    /// Turn this handle into an owned view, keeping its count
    #[track_caller]
    pub fn into_slice(self, start: usize, len: usize) -> SharedSlice {
        check_range(start, len, self.len());
        SharedSlice::from_parts(self, start, len)
    }

    /// Turn this handle into an owned view of the whole buffer
    pub fn into_shared(self) -> SharedSlice {
        let len = self.len();
        SharedSlice::from_parts(self, 0, len)
    }
}

impl Clone for RentedBuffer {
    /// Same as [`RentedBuffer::increment_and_share`]
    fn clone(&self) -> Self {
        self.increment_and_share()
    }
}

impl Drop for RentedBuffer {
    fn drop(&mut self) {
        let lease = unsafe { ManuallyDrop::take(&mut self.lease) };
        Lease::release(lease);
    }
}

impl Deref for RentedBuffer {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for RentedBuffer {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Default for RentedBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for RentedBuffer {
    fn from(buffer: Vec<u8>) -> Self {
        Self::adopt(buffer)
    }
}

impl fmt::Debug for RentedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RentedBuffer")
            .field("len", &self.len())
            .field("refs", &self.ref_count())
            .field("pooled", &self.is_pooled())
            .finish()
    }
}
