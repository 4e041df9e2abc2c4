/*!
 * Arena Configuration
 *
 * Bucket layout and retention policy for the buffer arena
 */

use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::{
    DEFAULT_BUCKET_POOL_LIMIT, DEFAULT_MAX_BUFFER_LENGTH, MAX_ARENA_BUFFER_LENGTH,
    MAX_QUEUE_CAPACITY,
};
use serde::{Deserialize, Serialize};

/// Per-bucket retention strategy
///
/// Only affects steady-state memory footprint, never correctness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketSizing {
    /// Largest class retains 1 buffer, doubling toward smaller classes up to `pool_limit`
    #[default]
    Exponential,
    /// Every class retains `pool_limit` buffers
    Flat,
}

/// Buffer arena configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Largest pooled buffer; rounded up to a power of two
    pub max_buffer_length: usize,
    /// Retention cap per bucket
    ///
    /// Rounded up to a power of two per bucket, so `5` retains up to 8
    /// buffers. Size memory budgets from
    /// [`BufferArena::configured_capacity_bytes`](super::BufferArena::configured_capacity_bytes).
    pub pool_limit: usize,
    /// How retention is spread across buckets
    pub sizing: BucketSizing,
    /// Fill every bucket to its limit at construction
    pub prefill: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_buffer_length: DEFAULT_MAX_BUFFER_LENGTH,
            pool_limit: DEFAULT_BUCKET_POOL_LIMIT,
            sizing: BucketSizing::Exponential,
            prefill: false,
        }
    }
}

impl ArenaConfig {
    /// Configuration for many small, short-lived buffers (protocol frames, scratch space)
    pub const fn small_messages() -> Self {
        Self {
            max_buffer_length: 64 * 1024,
            pool_limit: 256,
            sizing: BucketSizing::Flat,
            prefill: false,
        }
    }

    /// Configuration for few large payload buffers
    pub const fn large_payloads() -> Self {
        Self {
            max_buffer_length: 16 * 1024 * 1024,
            pool_limit: 16,
            sizing: BucketSizing::Exponential,
            prefill: false,
        }
    }

    pub fn with_max_buffer_length(mut self, max_buffer_length: usize) -> Self {
        self.max_buffer_length = max_buffer_length;
        self
    }

    pub fn with_pool_limit(mut self, pool_limit: usize) -> Self {
        self.pool_limit = pool_limit;
        self
    }

    pub fn with_sizing(mut self, sizing: BucketSizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_prefill(mut self, prefill: bool) -> Self {
        self.prefill = prefill;
        self
    }

    /// Parse and validate a JSON configuration
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> PoolResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot build an arena
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_buffer_length == 0 {
            return Err(PoolError::InvalidConfig(
                "max_buffer_length must be positive".into(),
            ));
        }
        if self.max_buffer_length > MAX_ARENA_BUFFER_LENGTH {
            return Err(PoolError::InvalidConfig(format!(
                "max_buffer_length {} exceeds limit {}",
                self.max_buffer_length, MAX_ARENA_BUFFER_LENGTH
            )));
        }
        if self.pool_limit == 0 || self.pool_limit > MAX_QUEUE_CAPACITY {
            return Err(PoolError::invalid_capacity(
                "arena bucket",
                self.pool_limit,
                MAX_QUEUE_CAPACITY,
            ));
        }
        Ok(())
    }

    /// Index of the largest bucket
    #[inline]
    pub fn max_bucket_index(&self) -> usize {
        bucket_index(self.max_buffer_length)
    }

    /// Number of buckets (classes `1, 2, 4, ..`, up to the rounded maximum)
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.max_bucket_index() + 1
    }

    /// Retention limit for a bucket before power-of-two rounding
    pub fn limit_for(&self, index: usize) -> usize {
        match self.sizing {
            BucketSizing::Flat => self.pool_limit,
            BucketSizing::Exponential => {
                let steps_from_largest = self.max_bucket_index().saturating_sub(index);
                1usize
                    .checked_shl(steps_from_largest as u32)
                    .unwrap_or(usize::MAX)
                    .min(self.pool_limit)
            }
        }
    }
}

/// Bucket index for a requested length: `ceil(log2(len))`
///
/// Lengths 0 and 1 both map to bucket 0.
#[inline]
pub fn bucket_index(len: usize) -> usize {
    if len <= 1 {
        0
    } else {
        (usize::BITS - (len - 1).leading_zeros()) as usize
    }
}

/// Buffer length served by a bucket
#[inline]
pub const fn class_length(index: usize) -> usize {
    1 << index
}
