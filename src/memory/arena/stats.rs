/*!
 * Arena Statistics
 */

use serde::{Deserialize, Serialize};

/// Per-bucket counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    /// Buffer length served by this bucket
    pub class_length: usize,
    /// Most buffers retained at once
    pub pool_limit: usize,
    /// Buffers currently parked in the bucket (approximate)
    pub pooled: usize,
    /// Rents served from the queue
    pub hits: u64,
    /// Rents that allocated
    pub misses: u64,
    /// Buffers accepted back
    pub returns: u64,
    /// Buffers dropped because the bucket was full
    pub drops: u64,
}

/// Arena-wide snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaStats {
    pub buckets: Vec<BucketStats>,
    /// Rents larger than the biggest class, served without pooling
    pub unpooled_rents: u64,
}

impl ArenaStats {
    /// Bytes currently parked across all buckets (approximate)
    pub fn pooled_bytes(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.class_length * b.pooled)
            .sum()
    }

    /// Calculate hit rate over pooled classes (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let (hits, misses) = self
            .buckets
            .iter()
            .fold((0u64, 0u64), |(h, m), b| (h + b.hits, m + b.misses));
        if hits + misses == 0 {
            0.0
        } else {
            hits as f64 / (hits + misses) as f64
        }
    }
}
