/*!
 * Bounded MPMC Queue
 *
 * Fixed-capacity multi-producer multi-consumer ring buffer. Every slot carries
 * a sequence number that says which lap currently owns it:
 *
 * ```text
 * seq == pos          slot empty, writable by the producer holding ticket `pos`
 * seq == pos + 1      slot full, readable by the consumer holding ticket `pos`
 * seq == pos + slots  slot empty again, writable one lap later
 * ```
 *
 * The ring always has at least two slots: with a single slot a full slot's
 * `pos + 1` is indistinguishable from the next producer's empty stamp. A
 * capacity-1 queue therefore runs on two slots and additionally bounds
 * `tail - head` by its capacity.
 *
 * Producers and consumers claim tickets by CAS on `tail` / `head`; the
 * sequence store that follows publishes the payload (Release) to whoever
 * observes it (Acquire). No locks, no allocation after construction.
 */

use crate::core::errors::{PoolError, PoolResult};
use crate::core::hints::{likely, unlikely};
use crate::core::limits::MAX_QUEUE_CAPACITY;
use crate::core::sync::{Backoff, CachePadded};
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{self, AtomicU32, Ordering};

struct Slot<T> {
    sequence: AtomicU32,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Lock-free bounded queue used as the recycling transport for pools
///
/// # Performance
/// - `try_enqueue`/`try_dequeue` never block or allocate
/// - Head and tail live on separate cache lines
/// - Capacity is a power of two, so slot lookup is a mask
///
/// # Ordering
/// FIFO among operations that do not overlap in time. Concurrent operations
/// linearize in ticket order.
pub struct BoundedQueue<T> {
    head: CachePadded<AtomicU32>,
    tail: CachePadded<AtomicU32>,
    slots: Box<[Slot<T>]>,
    mask: u32,
    capacity: u32,
}

// Slots are only touched by the thread holding their ticket
unsafe impl<T: Send> Send for BoundedQueue<T> {}
unsafe impl<T: Send> Sync for BoundedQueue<T> {}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at least `capacity` items
    ///
    /// Capacity is rounded up to the next power of two, minimum 1.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds [`MAX_QUEUE_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(queue) => queue,
            Err(err) => panic!("{}", err),
        }
    }

    /// Fallible constructor
    pub fn try_new(capacity: usize) -> PoolResult<Self> {
        if capacity > MAX_QUEUE_CAPACITY {
            return Err(PoolError::invalid_capacity(
                "bounded queue",
                capacity,
                MAX_QUEUE_CAPACITY,
            ));
        }

        let capacity = capacity.max(1).next_power_of_two();
        let slot_count = capacity.max(2);
        let slots = (0..slot_count as u32)
            .map(|i| Slot {
                sequence: AtomicU32::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            head: CachePadded::new(AtomicU32::new(0)),
            tail: CachePadded::new(AtomicU32::new(0)),
            slots,
            mask: slot_count as u32 - 1,
            capacity: capacity as u32,
        })
    }

    #[inline(always)]
    fn slot(&self, position: u32) -> &Slot<T> {
        &self.slots[(position & self.mask) as usize]
    }

    /// Enqueue an item without blocking
    ///
    /// Returns `Err(item)` when the queue is full.
    ///
    /// # Performance
    /// Hot path - one CAS on success, retries only under producer contention
    pub fn try_enqueue(&self, item: T) -> Result<(), T> {
        let mut backoff = Backoff::new();
        let mut tail = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = self.slot(tail);
            let sequence = slot.sequence.load(Ordering::Acquire);
            let distance = sequence.wrapping_sub(tail) as i32;

            if likely(distance == 0) {
                if unlikely(self.capacity <= self.mask) && self.at_capacity(tail) {
                    return Err(item);
                }
                match self.tail.compare_exchange_weak(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*slot.value.get()).write(item) };
                        slot.sequence.store(tail.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => {
                        tail = current;
                        backoff.spin();
                    }
                }
            } else if unlikely(distance < 0) {
                // Slot still holds last lap's item
                return Err(item);
            } else {
                // Another producer won this ticket
                backoff.spin();
                tail = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Whether ticket `tail` would exceed the logical capacity
    ///
    /// Only needed when the ring has more slots than capacity. A stale head
    /// can only report full early, never late.
    #[inline]
    fn at_capacity(&self, tail: u32) -> bool {
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) as i32 >= self.capacity as i32
    }

    /// Dequeue an item without blocking
    ///
    /// Returns `None` when the queue is empty, or when the only claimed slot
    /// is still being published by a stalled producer after a full backoff.
    ///
    /// # Performance
    /// Hot path - one CAS on success, retries only under consumer contention
    pub fn try_dequeue(&self) -> Option<T> {
        let mut backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Relaxed);

        loop {
            let slot = self.slot(head);
            let sequence = slot.sequence.load(Ordering::Acquire);
            let distance = sequence.wrapping_sub(head.wrapping_add(1)) as i32;

            if likely(distance == 0) {
                match self.head.compare_exchange_weak(
                    head,
                    head.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let item = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.sequence
                            .store(head.wrapping_add(self.mask + 1), Ordering::Release);
                        return Some(item);
                    }
                    Err(current) => {
                        head = current;
                        backoff.spin();
                    }
                }
            } else if distance < 0 {
                atomic::fence(Ordering::SeqCst);
                let tail = self.tail.load(Ordering::Relaxed);

                if tail == head || backoff.is_completed() {
                    return None;
                }

                // A producer owns this ticket but has not published yet
                backoff.snooze();
                head = self.head.load(Ordering::Relaxed);
            } else {
                // Another consumer won this ticket
                backoff.spin();
                head = self.head.load(Ordering::Relaxed);
            }
        }
    }

    /// Most items the queue holds at once (a power of two)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Get the current number of items (approximate)
    ///
    /// # Note
    /// The count may change immediately after this call returns.
    pub fn len(&self) -> usize {
        // Head first: tail never falls behind an earlier head
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail.wrapping_sub(head) as usize).min(self.capacity())
    }

    /// Check if the queue is empty (approximate)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the queue is full (approximate)
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}

impl<T> Drop for BoundedQueue<T> {
    fn drop(&mut self) {
        while self.try_dequeue().is_some() {}
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
