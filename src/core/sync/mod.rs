/*!
 * Synchronization Primitives
 *
 * Building blocks for the lock-free pooling paths:
 * - Bounded MPMC queue used as the recycling transport
 * - Cache-line padding for independent hot counters
 * - Adaptive backoff for contended CAS loops
 *
 * # Performance
 *
 * - No locks and no syscalls on any fast path
 * - Cache-line aligned counters to prevent false sharing
 */

pub mod lockfree;
mod padded;
mod spinwait;

pub use lockfree::BoundedQueue;
pub use padded::CachePadded;
pub use spinwait::Backoff;
