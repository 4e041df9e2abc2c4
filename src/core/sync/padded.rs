/*!
 * Cache-Line Padding
 *
 * Keeps independently written hot values (queue head and tail) on separate
 * cache lines so producers and consumers do not bounce the same line.
 */

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Value padded and aligned to [`CACHE_LINE_SIZE`](crate::core::limits::CACHE_LINE_SIZE)
///
/// # Cache-Line Alignment
///
/// 128 bytes: two 64-byte lines, so the adjacent-line prefetcher on x86_64
/// does not pull a neighbour's counter in with ours.
#[repr(C, align(128))]
#[derive(Default)]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    /// Pad a value
    #[inline]
    pub const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for CachePadded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePadded")
            .field("value", &self.value)
            .finish()
    }
}
