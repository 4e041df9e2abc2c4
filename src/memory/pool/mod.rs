/*!
 * Object Pools
 *
 * - `ObjectPool`: fast slot plus bounded queue, strict accounting
 * - `LooseObjectPool`: slot array only, may drop instances under races
 */

mod loose;
mod object_pool;
mod slot;
mod stats;

pub use loose::LooseObjectPool;
pub use object_pool::{Disposable, ObjectPool, Pooled};
pub use stats::PoolStats;
