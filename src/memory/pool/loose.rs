/*!
 * Loose Object Pool
 *
 * Relaxed alternative to [`ObjectPool`](super::ObjectPool): a small array of
 * atomic slots with no overflow queue. Each call checks only a couple of
 * slots starting from the most recently filled one, so under contention an
 * instance may be dropped even though another slot was free. Use it where
 * losing a cached instance costs one allocation and nothing else.
 */

use super::object_pool::{Disposable, Factory};
use super::slot::FastSlot;
use super::stats::{PoolCounters, PoolStats};
use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::{DEFAULT_LOOSE_POOL_SLOTS, MAX_QUEUE_CAPACITY};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Slots checked per rent/return
const SLOTS_PER_CALL: usize = 2;

/// Best-effort pool that checks a bounded number of slots
pub struct LooseObjectPool<T> {
    slots: Box<[FastSlot<T>]>,
    mask: usize,
    cursor: AtomicUsize,
    factory: Factory<T>,
    disposer: Option<fn(&mut T)>,
    counters: PoolCounters,
}

impl<T> LooseObjectPool<T> {
    /// Create a pool with `slots` cached instances (rounded to a power of two)
    pub fn new<F>(slots: usize, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(slots, Box::new(factory), None)
    }

    /// Create a pool with the default slot count
    pub fn from_factory<F>(factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(DEFAULT_LOOSE_POOL_SLOTS, factory)
    }

    fn build(slots: usize, factory: Factory<T>, disposer: Option<fn(&mut T)>) -> PoolResult<Self> {
        if slots == 0 || slots > MAX_QUEUE_CAPACITY {
            return Err(PoolError::invalid_capacity(
                "loose object pool",
                slots,
                MAX_QUEUE_CAPACITY,
            ));
        }

        let slots = slots.next_power_of_two();
        debug!(slots, "Created loose object pool");

        Ok(Self {
            slots: (0..slots).map(|_| FastSlot::new()).collect(),
            mask: slots - 1,
            cursor: AtomicUsize::new(0),
            factory,
            disposer,
            counters: PoolCounters::default(),
        })
    }

    /// Slot indices to try, starting at the most recently filled slot
    #[inline]
    fn candidates(&self) -> impl Iterator<Item = usize> {
        let start = self.cursor.load(Ordering::Relaxed);
        let mask = self.mask;
        (0..SLOTS_PER_CALL.min(self.slots.len())).map(move |i| (start + i) & mask)
    }

    /// Rent an instance, falling back to the factory
    pub fn rent(&self) -> Box<T> {
        for index in self.candidates() {
            if let Some(item) = self.slots[index].take() {
                self.counters.hit();
                return item;
            }
        }

        self.counters.miss();
        Box::new((self.factory)())
    }

    /// Return an instance; dropped when the candidate slots are occupied
    pub fn return_to_pool(&self, item: Box<T>) {
        let mut item = item;
        for index in self.candidates() {
            match self.slots[index].try_put(item) {
                Ok(()) => {
                    self.cursor.store(index, Ordering::Relaxed);
                    self.counters.returned();
                    return;
                }
                Err(back) => item = back,
            }
        }

        self.counters.discarded();
        if let Some(dispose) = self.disposer {
            dispose(&mut item);
        }
    }

    /// Number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

impl<T: Disposable> LooseObjectPool<T> {
    /// Create a loose pool that disposes instances it drops
    pub fn with_disposal<F>(slots: usize, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(slots, Box::new(factory), Some(T::dispose))
    }
}

impl<T> Drop for LooseObjectPool<T> {
    fn drop(&mut self) {
        if let Some(dispose) = self.disposer {
            for slot in self.slots.iter() {
                if let Some(mut item) = slot.take() {
                    dispose(&mut item);
                }
            }
        }
    }
}
