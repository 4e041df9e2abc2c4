/*!
 * Buffer Arena
 *
 * Size-classed pool of reference-counted byte buffers.
 *
 * # Architecture
 *
 * - One bucket per power-of-two class from 1 byte up to the configured maximum
 * - Each bucket recycles its buffers through a lock-free bounded queue
 * - Handles count their owners; the last release returns the storage exactly once
 * - Requests above the largest class are served unpooled
 *
 * # Performance
 *
 * - Rent and release are a queue operation plus one atomic count update
 * - Sharing and slicing never copy bytes
 */

mod bucket;
mod config;
mod lease;
mod rented;
mod shared;
mod stats;
mod view;

pub use config::{bucket_index, class_length, ArenaConfig, BucketSizing};
pub use rented::RentedBuffer;
pub use shared::{SharedSlice, SharedSliceMut};
pub use stats::{ArenaStats, BucketStats};
pub use view::{BufferView, BufferViewMut};

use crate::core::errors::PoolResult;
use crate::monitoring::span_maintenance;
use bucket::Bucket;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace, warn};

static SHARED_ARENA: OnceLock<BufferArena> = OnceLock::new();

/// Pool of size-classed, reference-counted byte buffers
pub struct BufferArena {
    buckets: Vec<Arc<Bucket>>,
    config: ArenaConfig,
    unpooled_rents: AtomicU64,
}

impl BufferArena {
    /// Build an arena; the configuration is validated up front
    pub fn new(config: ArenaConfig) -> PoolResult<Self> {
        config.validate()?;

        let buckets = (0..config.bucket_count())
            .map(|index| Bucket::new(index, config.limit_for(index)).map(Arc::new))
            .collect::<PoolResult<Vec<_>>>()?;

        let arena = Self {
            buckets,
            config,
            unpooled_rents: AtomicU64::new(0),
        };

        debug!(
            max_buffer_length = arena.max_buffer_length(),
            buckets = arena.buckets.len(),
            sizing = ?arena.config.sizing,
            capacity_bytes = arena.configured_capacity_bytes(),
            "Buffer arena initialized"
        );

        if arena.config.prefill {
            arena.prefill();
        }

        Ok(arena)
    }

    /// Process-wide arena with the default configuration
    pub fn shared() -> &'static BufferArena {
        SHARED_ARENA.get_or_init(|| Self::build(ArenaConfig::default()))
    }

    fn build(config: ArenaConfig) -> Self {
        match Self::new(config) {
            Ok(arena) => arena,
            Err(err) => panic!("default arena configuration rejected: {}", err),
        }
    }

    #[inline]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Largest pooled length (the configured maximum rounded to a power of two)
    #[inline]
    pub fn max_buffer_length(&self) -> usize {
        class_length(self.buckets.len() - 1)
    }

    /// Rent a buffer of at least `min_length` bytes
    ///
    /// Pooled buffers have the class length (`min_length` rounded up to a power
    /// of two) and may hold bytes from their previous renter. Lengths above the
    /// largest class get an unpooled, zeroed buffer of exactly `min_length`.
    pub fn rent(&self, min_length: usize) -> RentedBuffer {
        if min_length == 0 {
            return RentedBuffer::empty();
        }

        match self.buckets.get(bucket_index(min_length)) {
            Some(bucket) => bucket.rent(),
            None => {
                self.unpooled_rents.fetch_add(1, Ordering::Relaxed);
                trace!(min_length, "Rent above largest class, allocating unpooled");
                RentedBuffer::unpooled(min_length)
            }
        }
    }

    /// Total bytes the buckets may retain when full
    pub fn configured_capacity_bytes(&self) -> u64 {
        self.buckets.iter().fold(0u64, |total, bucket| {
            let bytes = (bucket.class_length() as u64).saturating_mul(bucket.pool_limit() as u64);
            total.saturating_add(bytes)
        })
    }

    /// Fill every bucket to its limit; returns the buffers allocated
    pub fn prefill(&self) -> usize {
        let span = span_maintenance("prefill");
        let _entered = span.enter();

        let mut added = 0;
        for bucket in &self.buckets {
            let filled = bucket.prefill();
            let pooled = bucket.stats().pooled;
            if pooled < bucket.pool_limit() {
                warn!(
                    class_length = bucket.class_length(),
                    pooled,
                    pool_limit = bucket.pool_limit(),
                    "Prefill could not fill bucket"
                );
            }
            added += filled;
        }
        span.record_buffers(added);
        debug!(buffers = added, "Buffer arena prefilled");
        added
    }

    /// Drop every pooled buffer; returns the bytes freed
    ///
    /// Rented buffers are unaffected and still return to their bucket later.
    pub fn trim(&self) -> usize {
        let span = span_maintenance("trim");
        let _entered = span.enter();

        let freed = self.buckets.iter().map(|bucket| bucket.trim()).sum();
        span.record_bytes(freed);
        debug!(bytes = freed, "Buffer arena trimmed");
        freed
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            buckets: self.buckets.iter().map(|bucket| bucket.stats()).collect(),
            unpooled_rents: self.unpooled_rents.load(Ordering::Relaxed),
        }
    }
}

impl Default for BufferArena {
    fn default() -> Self {
        Self::build(ArenaConfig::default())
    }
}

impl fmt::Debug for BufferArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferArena")
            .field("config", &self.config)
            .field("buckets", &self.buckets.len())
            .field("unpooled_rents", &self.unpooled_rents.load(Ordering::Relaxed))
            .finish()
    }
}
