/*!
 * Object Pooling for Hot Paths
 * Reduces allocation pressure by reusing boxed instances
 */

use super::slot::FastSlot;
use super::stats::{PoolCounters, PoolStats};
use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::{DEFAULT_OBJECT_POOL_CAPACITY, MAX_QUEUE_CAPACITY};
use crate::core::sync::BoundedQueue;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

/// Disposal hook for pooled types that hold resources
///
/// The pool calls `dispose` exactly once on every instance it discards
/// instead of recycling: when a return finds the pool full, and for every
/// retained instance when the pool is dropped. Rented instances are never
/// disposed by the pool.
pub trait Disposable {
    fn dispose(&mut self);
}

pub(crate) type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Pool of reusable boxed instances
///
/// # Performance
///
/// - **Fast slot**: one instance exchanged atomically, no queue traffic in the
///   single-threaded or low-contention case
/// - **Overflow queue**: lock-free [`BoundedQueue`] for everything else
/// - **Never fails**: a miss falls back to the factory
///
/// # Example
///
/// ```ignore
/// let pool = ObjectPool::new(32, || Vec::<u8>::with_capacity(4096))?;
///
/// let mut scratch = pool.rent();
/// scratch.extend_from_slice(b"data");
/// scratch.clear();
/// pool.return_to_pool(scratch);
/// ```
///
/// Returning an instance twice, or one that did not come from this pool, is
/// not detected.
pub struct ObjectPool<T> {
    fast: FastSlot<T>,
    queue: BoundedQueue<Box<T>>,
    factory: Factory<T>,
    disposer: Option<fn(&mut T)>,
    counters: PoolCounters,
}

impl<T> ObjectPool<T> {
    /// Create a pool that queues up to `capacity` instances
    ///
    /// `capacity` is rounded up to a power of two. The fast slot holds one
    /// more on top of that.
    pub fn new<F>(capacity: usize, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(capacity, Box::new(factory), None)
    }

    /// Create a pool with the default queue capacity
    pub fn from_factory<F>(factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(DEFAULT_OBJECT_POOL_CAPACITY, factory)
    }

    fn build(
        capacity: usize,
        factory: Factory<T>,
        disposer: Option<fn(&mut T)>,
    ) -> PoolResult<Self> {
        if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
            return Err(PoolError::invalid_capacity(
                "object pool",
                capacity,
                MAX_QUEUE_CAPACITY,
            ));
        }

        let queue = BoundedQueue::try_new(capacity)?;
        debug!(
            requested = capacity,
            queue_capacity = queue.capacity(),
            disposable = disposer.is_some(),
            "Created object pool"
        );

        Ok(Self {
            fast: FastSlot::new(),
            queue,
            factory,
            disposer,
            counters: PoolCounters::default(),
        })
    }

    /// Rent an instance
    ///
    /// Fast slot first, then the queue, then the factory.
    #[inline]
    pub fn rent(&self) -> Box<T> {
        if let Some(item) = self.fast.take() {
            self.counters.hit();
            return item;
        }

        if let Some(item) = self.queue.try_dequeue() {
            self.counters.hit();
            return item;
        }

        self.counters.miss();
        trace!("Object pool miss, invoking factory");
        Box::new((self.factory)())
    }

    /// Rent an instance that returns itself on drop
    #[inline]
    pub fn rent_scoped(&self) -> Pooled<'_, T> {
        Pooled {
            pool: self,
            item: ManuallyDrop::new(self.rent()),
        }
    }

    /// Give an instance back for reuse
    ///
    /// When both the fast slot and the queue are full the instance is
    /// disposed (if the pool has a disposal hook) and dropped.
    #[inline]
    pub fn return_to_pool(&self, item: Box<T>) {
        let item = match self.fast.try_put(item) {
            Ok(()) => {
                self.counters.returned();
                return;
            }
            Err(item) => item,
        };

        match self.queue.try_enqueue(item) {
            Ok(()) => self.counters.returned(),
            Err(item) => {
                self.counters.discarded();
                trace!("Object pool full, discarding instance");
                self.discard(item);
            }
        }
    }

    fn discard(&self, mut item: Box<T>) {
        if let Some(dispose) = self.disposer {
            dispose(&mut item);
        }
    }

    /// Queue capacity (a power of two)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Most instances the pool retains at once (queue plus fast slot)
    #[inline]
    pub fn retained_capacity(&self) -> usize {
        self.queue.capacity() + 1
    }

    /// Instances currently retained (approximate)
    pub fn available(&self) -> usize {
        self.queue.len() + usize::from(self.fast.is_occupied())
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

impl<T: Disposable> ObjectPool<T> {
    /// Create a pool that disposes instances it cannot retain
    pub fn with_disposal<F>(capacity: usize, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(capacity, Box::new(factory), Some(T::dispose))
    }
}

impl<T> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        let mut drained = 0usize;
        while let Some(item) = self.fast.take().or_else(|| self.queue.try_dequeue()) {
            self.discard(item);
            drained += 1;
        }
        if drained > 0 {
            trace!(drained, "Object pool dropped, retained instances released");
        }
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}

/// Pooled instance that auto-returns to its pool on drop
pub struct Pooled<'a, T> {
    pool: &'a ObjectPool<T>,
    item: ManuallyDrop<Box<T>>,
}

impl<'a, T> Pooled<'a, T> {
    /// Keep the instance instead of returning it
    pub fn detach(self) -> Box<T> {
        let mut this = ManuallyDrop::new(self);
        unsafe { ManuallyDrop::take(&mut this.item) }
    }
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        let item = unsafe { ManuallyDrop::take(&mut self.item) };
        self.pool.return_to_pool(item);
    }
}
