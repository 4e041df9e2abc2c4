/*!
 * AI-OS Pool Library
 * Lock-free bounded queue, object pools and a reference-counted buffer arena
 */

#![cfg_attr(feature = "nightly", feature(core_intrinsics))]
#![cfg_attr(feature = "nightly", allow(internal_features))]

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::{PoolError, PoolResult};
pub use memory::arena::{
    ArenaConfig, ArenaStats, BucketSizing, BufferArena, BufferView, BufferViewMut, RentedBuffer,
    SharedSlice, SharedSliceMut,
};
pub use memory::pool::{Disposable, LooseObjectPool, ObjectPool, PoolStats, Pooled};
pub use monitoring::init_tracing;
