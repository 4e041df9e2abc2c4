/*!
 * Lock-Free Data Structures
 *
 * - Bounded MPMC queue (sequence-numbered ring buffer)
 */

mod bounded_queue;

pub use bounded_queue::BoundedQueue;
