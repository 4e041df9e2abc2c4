/*!
 * Arena Bucket
 * One power-of-two size class and its recycling queue
 */

use super::lease::Lease;
use super::rented::RentedBuffer;
use super::stats::BucketStats;
use crate::core::errors::PoolResult;
use crate::core::sync::BoundedQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

pub(crate) struct Bucket {
    index: usize,
    class_length: usize,
    queue: BoundedQueue<Arc<Lease>>,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

impl Bucket {
    pub(crate) fn new(index: usize, pool_limit: usize) -> PoolResult<Self> {
        Ok(Self {
            index,
            class_length: super::config::class_length(index),
            queue: BoundedQueue::try_new(pool_limit)?,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        })
    }

    #[inline]
    pub(crate) fn class_length(&self) -> usize {
        self.class_length
    }

    /// Buffers this bucket retains at most (queue capacity)
    #[inline]
    pub(crate) fn pool_limit(&self) -> usize {
        self.queue.capacity()
    }

    /// Rent a recycled buffer, or allocate a new one of this class
    pub(crate) fn rent(self: &Arc<Self>) -> RentedBuffer {
        if let Some(lease) = self.queue.try_dequeue() {
            lease.reset();
            self.hits.fetch_add(1, Ordering::Relaxed);
            return RentedBuffer::from_lease(lease);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(
            bucket = self.index,
            class_length = self.class_length,
            "Bucket empty, allocating buffer"
        );
        RentedBuffer::from_lease(self.allocate())
    }

    fn allocate(self: &Arc<Self>) -> Arc<Lease> {
        Lease::zeroed(self.class_length, Some(Arc::downgrade(self)))
    }

    /// Take back a lease whose last owner released it
    pub(crate) fn recycle(&self, lease: Arc<Lease>) {
        match self.queue.try_enqueue(lease) {
            Ok(()) => {
                self.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(lease) => {
                self.drops.fetch_add(1, Ordering::Relaxed);
                trace!(
                    bucket = self.index,
                    class_length = self.class_length,
                    "Bucket full, dropping buffer"
                );
                drop(lease);
            }
        }
    }

    /// Allocate buffers until the queue is full; returns how many were added
    pub(crate) fn prefill(self: &Arc<Self>) -> usize {
        let mut added = 0;
        while !self.queue.is_full() {
            let lease = self.allocate();
            lease.decrement();
            if self.queue.try_enqueue(lease).is_err() {
                break;
            }
            added += 1;
        }
        added
    }

    /// Drop every pooled buffer; returns the bytes freed
    pub(crate) fn trim(&self) -> usize {
        let mut freed = 0;
        while let Some(lease) = self.queue.try_dequeue() {
            freed += lease.len();
        }
        freed
    }

    pub(crate) fn stats(&self) -> BucketStats {
        BucketStats {
            class_length: self.class_length,
            pool_limit: self.pool_limit(),
            pooled: self.queue.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}
