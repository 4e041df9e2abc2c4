/*!
 * Memory Module
 * Object pooling and buffer renting
 */

pub mod arena;
pub mod pool;

// Re-export for convenience
pub use arena::{ArenaConfig, BufferArena, RentedBuffer};
pub use pool::{ObjectPool, Pooled};
