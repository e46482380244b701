//! Delivery metrics for observability
//!
//! Provides lock-free counters for ingestion and delivery outcomes and a
//! running-average latency aggregator.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics for client observability
///
/// Every field is an independent atomic. A snapshot reads them one by one, so
/// it is suitable for monitoring but not for exact cross-field reconciliation.
///
/// # Example
///
/// ```
/// use rust_log_shipper::Metrics;
/// use std::time::Duration;
///
/// let metrics = Metrics::new();
/// metrics.record_total();
/// metrics.record_latency(Duration::from_millis(20));
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.total_logs, 1);
/// assert_eq!(snapshot.avg_latency_ms, 20);
/// ```
#[derive(Debug)]
pub struct Metrics {
    /// Entries accepted by `log` (including ones later dropped)
    total_logs: AtomicU64,

    /// Batches delivered successfully
    success_logs: AtomicU64,

    /// Batches dropped after exhausting retries
    failed_logs: AtomicU64,

    /// Entries dropped because the queue was full
    dropped_logs: AtomicU64,

    latency_sum_nanos: AtomicU64,
    latency_count: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logs: AtomicU64::new(0),
            success_logs: AtomicU64::new(0),
            failed_logs: AtomicU64::new(0),
            dropped_logs: AtomicU64::new(0),
            latency_sum_nanos: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_total(&self) -> u64 {
        self.total_logs.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_success(&self) -> u64 {
        self.success_logs.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed_logs.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a dropped entry, returning the previous drop count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_logs.fetch_add(1, Ordering::Relaxed)
    }

    /// Accumulate one latency sample
    pub fn record_latency(&self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.latency_sum_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Average latency in whole milliseconds, 0 when nothing was recorded
    pub fn avg_latency_ms(&self) -> u64 {
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        let sum = self.latency_sum_nanos.load(Ordering::Relaxed);
        (sum / count) / 1_000_000
    }

    pub fn total_logs(&self) -> u64 {
        self.total_logs.load(Ordering::Relaxed)
    }

    pub fn success_logs(&self) -> u64 {
        self.success_logs.load(Ordering::Relaxed)
    }

    pub fn failed_logs(&self) -> u64 {
        self.failed_logs.load(Ordering::Relaxed)
    }

    pub fn dropped_logs(&self) -> u64 {
        self.dropped_logs.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_logs: self.total_logs(),
            success_logs: self.success_logs(),
            failed_logs: self.failed_logs(),
            dropped_logs: self.dropped_logs(),
            avg_latency_ms: self.avg_latency_ms(),
        }
    }

    /// Reset all metrics to zero
    ///
    /// Not atomic across fields.
    pub fn reset(&self) {
        self.total_logs.store(0, Ordering::Relaxed);
        self.success_logs.store(0, Ordering::Relaxed);
        self.failed_logs.store(0, Ordering::Relaxed);
        self.dropped_logs.store(0, Ordering::Relaxed);
        self.latency_sum_nanos.store(0, Ordering::Relaxed);
        self.latency_count.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the metrics, e.g. for health endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_logs: u64,
    pub success_logs: u64,
    pub failed_logs: u64,
    pub dropped_logs: u64,
    pub avg_latency_ms: u64,
}

impl MetricsSnapshot {
    /// Share of accepted entries dropped at the queue, as a percentage
    ///
    /// Returns 0.0 if nothing has been logged.
    pub fn drop_rate(&self) -> f64 {
        if self.total_logs == 0 {
            0.0
        } else {
            (self.dropped_logs as f64 / self.total_logs as f64) * 100.0
        }
    }
}
