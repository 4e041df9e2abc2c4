/*!
 * Pool Limits and Constants
 *
 * Centralized location for capacity limits, defaults and layout constants.
 * Values are grouped by component.
 * - Performance-critical constants are marked with [PERF]
 */

// =============================================================================
// LAYOUT
// =============================================================================

/// Cache line size used for padding hot counters (128 bytes)
/// [PERF] Covers adjacent-line prefetching on x86_64 and 128-byte lines on Apple silicon
pub const CACHE_LINE_SIZE: usize = 128;

// =============================================================================
// BOUNDED QUEUE
// =============================================================================

/// Largest supported queue capacity (2^30 slots)
/// Head/tail are 32-bit wrapping counters; keeping capacity below 2^31 keeps
/// the signed sequence distance unambiguous.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 30;

/// Spin iterations before a contended CAS loop starts yielding
/// [PERF] Past this point the other thread is likely descheduled
pub const BACKOFF_SPIN_LIMIT: u32 = 6;

/// Backoff step after which the backoff is considered saturated
pub const BACKOFF_YIELD_LIMIT: u32 = 10;

// =============================================================================
// OBJECT POOL
// =============================================================================

/// Default number of queued instances per object pool
pub const DEFAULT_OBJECT_POOL_CAPACITY: usize = 64;

/// Default slot count for the loose object pool
pub const DEFAULT_LOOSE_POOL_SLOTS: usize = 16;

// =============================================================================
// BUFFER ARENA
// =============================================================================

/// Default largest pooled buffer (1MB)
/// Larger rents are served unpooled
pub const DEFAULT_MAX_BUFFER_LENGTH: usize = 1024 * 1024;

/// Default per-bucket retention limit
pub const DEFAULT_BUCKET_POOL_LIMIT: usize = 64;

/// Largest class an arena may be configured with (1GB)
pub const MAX_ARENA_BUFFER_LENGTH: usize = 1 << 30;

/// Reference count of a freshly rented buffer
pub const SINGLE_OWNER: isize = 1;
