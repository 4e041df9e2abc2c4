/*!
 * Core Module
 * Error types, limits, hints and synchronization primitives
 */

pub mod errors;
pub mod hints;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use errors::{PoolError, PoolResult};
pub use sync::{Backoff, BoundedQueue, CachePadded};
