/*!
 * Shared Slices
 *
 * Owned windows over a rented buffer. Each slice holds one count of the
 * underlying buffer, so it can outlive the handle it was cut from, cross
 * threads, and be re-sliced without copying.
 */

use super::rented::RentedBuffer;
use super::view::BufferView;
use crate::core::errors::check_range;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Read-only owned window; cloning adds an owner
pub struct SharedSlice {
    buffer: RentedBuffer,
    start: usize,
    len: usize,
}

impl SharedSlice {
    #[inline]
    pub(crate) fn from_parts(buffer: RentedBuffer, start: usize, len: usize) -> Self {
        Self { buffer, start, len }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start of this window within the physical buffer
    #[inline]
    pub fn offset(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn ref_count(&self) -> isize {
        self.buffer.ref_count()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer.as_slice()[self.start..self.start + self.len]
    }

    /// Borrowed view, offsets relative to the physical buffer
    pub fn view(&self) -> BufferView<'_> {
        BufferView::new(self.as_slice(), self.start)
    }

    /// Narrow to `start..`, consuming this slice
    #[track_caller]
    pub fn slice(self, start: usize) -> SharedSlice {
        check_range(start, 0, self.len);
        let len = self.len - start;
        self.slice_range(start, len)
    }

    /// Narrow to `start..start + len`, consuming this slice
    #[track_caller]
    pub fn slice_range(self, start: usize, len: usize) -> SharedSlice {
        check_range(start, len, self.len);
        SharedSlice::from_parts(self.buffer, self.start + start, len)
    }

    /// Another owner of the same window
    #[track_caller]
    pub fn share(&self) -> SharedSlice {
        SharedSlice::from_parts(self.buffer.increment_and_share(), self.start, self.len)
    }

    /// Another owner of a narrower window
    #[track_caller]
    pub fn share_range(&self, start: usize, len: usize) -> SharedSlice {
        check_range(start, len, self.len);
        SharedSlice::from_parts(self.buffer.increment_and_share(), self.start + start, len)
    }

    /// Writable window, if this is the buffer's only owner
    ///
    /// Hands the slice back unchanged when it is shared.
    pub fn try_into_mut(self) -> Result<SharedSliceMut, SharedSlice> {
        if self.buffer.is_unique() {
            Ok(SharedSliceMut {
                buffer: self.buffer,
                start: self.start,
                len: self.len,
            })
        } else {
            Err(self)
        }
    }

    /// Whole-buffer handle, dropping the window
    pub fn into_buffer(self) -> RentedBuffer {
        self.buffer
    }
}

impl Clone for SharedSlice {
    fn clone(&self) -> Self {
        self.share()
    }
}

impl Deref for SharedSlice {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for SharedSlice {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for SharedSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSlice")
            .field("offset", &self.start)
            .field("len", &self.len)
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// Writable owned window over a buffer with a single owner
///
/// Not `Clone`: sharing requires going through [`SharedSliceMut::into_read_only`].
pub struct SharedSliceMut {
    buffer: RentedBuffer,
    start: usize,
    len: usize,
}

impl SharedSliceMut {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.start
    }

    /// Narrow to `start..`, consuming this slice
    #[track_caller]
    pub fn slice(self, start: usize) -> SharedSliceMut {
        check_range(start, 0, self.len);
        let len = self.len - start;
        self.slice_range(start, len)
    }

    /// Narrow to `start..start + len`, consuming this slice
    #[track_caller]
    pub fn slice_range(self, start: usize, len: usize) -> SharedSliceMut {
        check_range(start, len, self.len);
        SharedSliceMut {
            buffer: self.buffer,
            start: self.start + start,
            len,
        }
    }

    /// Give up write access; the result can be shared
    pub fn into_read_only(self) -> SharedSlice {
        SharedSlice::from_parts(self.buffer, self.start, self.len)
    }
}

impl Deref for SharedSliceMut {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        &self.buffer.as_slice()[self.start..self.start + self.len]
    }
}

impl DerefMut for SharedSliceMut {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [u8] {
        // Single owner and not Clone; no other handle can observe the bytes
        let bytes = unsafe { self.buffer.as_mut_slice_unchecked() };
        &mut bytes[self.start..self.start + self.len]
    }
}

impl fmt::Debug for SharedSliceMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSliceMut")
            .field("offset", &self.start)
            .field("len", &self.len)
            .finish()
    }
}
