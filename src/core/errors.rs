/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors raised by the queue, object pool and buffer arena
///
/// Capacity misses (full queue, empty queue, full bucket) are never reported
/// through this type. Construction problems are returned as values; invariant
/// violations are raised as panics carrying the same display text.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PoolError {
    #[error("Invalid capacity for {what}: {requested} (must be between 1 and {max})")]
    #[diagnostic(
        code(pool::invalid_capacity),
        help("Capacities are rounded up to a power of two; pick a positive value within the limit.")
    )]
    InvalidCapacity {
        what: String,
        requested: usize,
        max: usize,
    },

    #[error("Invalid arena configuration: {0}")]
    #[diagnostic(
        code(pool::invalid_config),
        help("Review max_buffer_length and pool_limit in the arena configuration.")
    )]
    InvalidConfig(String),

    #[error("Buffer already returned to its pool (reference count {refs})")]
    #[diagnostic(
        code(pool::use_after_return),
        help("A handle was shared after its last owner released it. Use try_increment for racy sharing.")
    )]
    UseAfterReturn { refs: isize },

    #[error("Buffer released more times than it was shared (reference count {refs})")]
    #[diagnostic(
        code(pool::over_release),
        help("Every rent and every share must be matched by exactly one release.")
    )]
    OverRelease { refs: isize },

    #[error("Mutable access requested on a shared buffer ({refs} owners)")]
    #[diagnostic(
        code(pool::shared_mutation),
        help("Take mutable views before sharing, or synchronize writers and use as_mut_slice_unchecked.")
    )]
    SharedMutation { refs: isize },

    #[error("Range {start}..{start}+{len} out of bounds for view of length {available}")]
    #[diagnostic(
        code(pool::out_of_range),
        help("Slices only narrow an existing view; they never grow past its end.")
    )]
    OutOfRange {
        start: usize,
        len: usize,
        available: usize,
    },
}

impl PoolError {
    pub(crate) fn invalid_capacity(what: impl Into<String>, requested: usize, max: usize) -> Self {
        PoolError::InvalidCapacity {
            what: what.into(),
            requested,
            max,
        }
    }
}

/// Panic with a pool invariant violation
///
/// Continuing after one of these would alias storage another owner may
/// already be using.
#[cold]
#[track_caller]
pub(crate) fn invariant_violation(err: PoolError) -> ! {
    panic!("{}", err)
}

/// Validate that `start..start + len` lies within `available`
#[inline]
#[track_caller]
pub(crate) fn check_range(start: usize, len: usize, available: usize) {
    let fits = start
        .checked_add(len)
        .map_or(false, |end| end <= available);
    if !fits {
        invariant_violation(PoolError::OutOfRange {
            start,
            len,
            available,
        });
    }
}
