/*!
 * Buffer Views
 *
 * Borrowed windows over rented bytes. A view carries its offset into the
 * physical buffer so nested slices can be traced back to the original.
 * Slicing only narrows; out-of-range requests panic with `OutOfRange`.
 */

use crate::core::errors::check_range;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Read-only window over a buffer
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BufferView<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> BufferView<'a> {
    #[inline]
    pub(crate) fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Start of this view within the physical buffer
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    /// Narrow to `start..`
    #[track_caller]
    pub fn slice(&self, start: usize) -> BufferView<'a> {
        check_range(start, 0, self.len());
        self.slice_range(start, self.len() - start)
    }

    /// Narrow to `start..start + len`
    #[track_caller]
    pub fn slice_range(&self, start: usize, len: usize) -> BufferView<'a> {
        check_range(start, len, self.len());
        BufferView::new(&self.bytes[start..start + len], self.offset + start)
    }
}

impl<'a> From<&'a [u8]> for BufferView<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes, 0)
    }
}

impl Deref for BufferView<'_> {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl AsRef<[u8]> for BufferView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl fmt::Debug for BufferView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferView")
            .field("offset", &self.offset)
            .field("len", &self.len())
            .finish()
    }
}

/// Exclusive writable window over a buffer
pub struct BufferViewMut<'a> {
    bytes: &'a mut [u8],
    offset: usize,
}

impl<'a> BufferViewMut<'a> {
    #[inline]
    pub(crate) fn new(bytes: &'a mut [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Narrow to `start..`, consuming this view
    #[track_caller]
    pub fn slice(self, start: usize) -> BufferViewMut<'a> {
        check_range(start, 0, self.len());
        let len = self.len() - start;
        self.slice_range(start, len)
    }

    /// Narrow to `start..start + len`, consuming this view
    #[track_caller]
    pub fn slice_range(self, start: usize, len: usize) -> BufferViewMut<'a> {
        check_range(start, len, self.len());
        let offset = self.offset + start;
        let bytes = self.bytes;
        BufferViewMut::new(&mut bytes[start..start + len], offset)
    }

    /// Shorter-lived view, leaving this one usable afterwards
    #[inline]
    pub fn reborrow(&mut self) -> BufferViewMut<'_> {
        BufferViewMut::new(&mut *self.bytes, self.offset)
    }

    /// Read-only view borrowing from this one
    #[inline]
    pub fn as_read_only(&self) -> BufferView<'_> {
        BufferView::new(&*self.bytes, self.offset)
    }

    /// Give up write access for the rest of the borrow
    #[inline]
    pub fn into_read_only(self) -> BufferView<'a> {
        BufferView::new(self.bytes, self.offset)
    }
}

impl<'a> From<&'a mut [u8]> for BufferViewMut<'a> {
    fn from(bytes: &'a mut [u8]) -> Self {
        Self::new(bytes, 0)
    }
}

impl Deref for BufferViewMut<'_> {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        &*self.bytes
    }
}

impl DerefMut for BufferViewMut<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }
}

impl fmt::Debug for BufferViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferViewMut")
            .field("offset", &self.offset)
            .field("len", &self.len())
            .finish()
    }
}
