/*!
 * Adaptive Spin-Wait Backoff
 *
 * Used by CAS retry loops. Spins with exponentially growing bursts, then
 * starts yielding to the scheduler once the other party is likely descheduled.
 * Never parks: lock-free callers must stay syscall-free on the fast path.
 */

use crate::core::limits::{BACKOFF_SPIN_LIMIT, BACKOFF_YIELD_LIMIT};
use std::hint;
use std::thread;

/// Exponential backoff for contended atomics
///
/// # Performance
///
/// - Short bursts for the first few retries (`2^step` spin hints)
/// - `thread::yield_now` past [`BACKOFF_SPIN_LIMIT`]
/// - Stateless between loops; create one per operation
#[derive(Debug, Default)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    /// Create a fresh backoff
    #[inline]
    pub const fn new() -> Self {
        Self { step: 0 }
    }

    /// Back off after a failed CAS
    ///
    /// Only spins; the caller is expected to retry immediately afterwards.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(BACKOFF_SPIN_LIMIT) {
            hint::spin_loop();
        }
        if self.step <= BACKOFF_SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Back off while waiting on another thread to finish a publish
    ///
    /// Spins first, then yields to the scheduler.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= BACKOFF_SPIN_LIMIT {
            for _ in 0..1u32 << self.step {
                hint::spin_loop();
            }
        } else {
            thread::yield_now();
        }
        if self.step <= BACKOFF_YIELD_LIMIT {
            self.step += 1;
        }
    }

    /// Whether the backoff has reached its yielding phase
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > BACKOFF_YIELD_LIMIT
    }
}
