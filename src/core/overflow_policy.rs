//! Overflow policies for the ingestion queue
//!
//! When the bounded queue is full, the policy decides whether a new entry is
//! dropped right away or the producer waits a bounded time for space.

use std::fmt;
use std::time::Duration;

/// Longest time a producer is blocked waiting for queue space
pub const QUEUE_FULL_TIMEOUT: Duration = Duration::from_secs(5);

/// Policy for handling a full ingestion queue
///
/// Both variants count the lost entry in the dropped metric. Only
/// `BlockWithTimeout` reports the loss to the caller.
///
/// # Example
///
/// ```
/// use rust_log_shipper::{Config, OverflowPolicy};
/// use std::time::Duration;
///
/// let config = Config { discard_on_full: true, ..Config::default() };
/// assert_eq!(config.overflow_policy(), OverflowPolicy::Discard);
///
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_secs(5));
/// assert_eq!(policy.to_string(), "BlockWithTimeout(5s)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the new entry and report success
    Discard,

    /// Wait up to the given time for space, then drop and return `QueueFull`
    BlockWithTimeout(Duration),
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::BlockWithTimeout(QUEUE_FULL_TIMEOUT)
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Discard => write!(f, "Discard"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
        }
    }
}

/// Whether a drop count deserves a warning: the first drop, then every 1000th
pub(crate) fn should_alert(dropped_before: u64) -> bool {
    dropped_before == 0 || (dropped_before + 1) % 1000 == 0
}
