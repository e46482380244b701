//! Bulk sender with capped linear retry backoff

use super::http::BulkTransport;
use super::index_pattern::IndexPattern;
use super::payload::BulkPayload;
use crate::core::{Config, LogEntry, LoggerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Upper bound on the construction-time connectivity probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait before retry `attempt` (1-based): `min(attempt × interval, max)`
///
/// ```
/// use rust_log_shipper::transport::retry_backoff;
/// use std::time::Duration;
///
/// let interval = Duration::from_secs(1);
/// let max = Duration::from_millis(2500);
/// assert_eq!(retry_backoff(1, interval, max), Duration::from_secs(1));
/// assert_eq!(retry_backoff(2, interval, max), Duration::from_secs(2));
/// assert_eq!(retry_backoff(3, interval, max), max);
/// ```
pub fn retry_backoff(attempt: u32, interval: Duration, max: Duration) -> Duration {
    interval.saturating_mul(attempt).min(max)
}

/// Delivery settings taken from [`Config`]
#[derive(Debug, Clone)]
pub struct SenderSettings {
    pub index_pattern: IndexPattern,
    pub retry_count: u32,
    pub retry_interval: Duration,
    pub max_retry_backoff: Duration,
    pub compression: bool,
}

impl SenderSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            index_pattern: IndexPattern::new(config.index_pattern.as_str()),
            retry_count: config.retry_count,
            retry_interval: config.retry_interval,
            max_retry_backoff: config.max_retry_backoff,
            compression: config.enable_compression,
        }
    }
}

/// Turns batches of entries into bulk requests and retries failures
///
/// The sender never drops entries on its own: every failure is returned to
/// the caller, which decides what happens to the batch.
pub struct BulkSender {
    transport: Arc<dyn BulkTransport>,
    settings: SenderSettings,
    closed: AtomicBool,
}

impl BulkSender {
    /// Create a sender after one successful connectivity probe
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` if the probe fails or does not answer within
    /// [`PROBE_TIMEOUT`]. The probe is not retried.
    pub async fn new(transport: Arc<dyn BulkTransport>, settings: SenderSettings) -> Result<Self> {
        match tokio::time::timeout(PROBE_TIMEOUT, transport.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(LoggerError::ConnectionFailed { address, message })) => {
                return Err(LoggerError::ConnectionFailed { address, message });
            }
            Ok(Err(e)) => return Err(LoggerError::connection_failed(transport.name(), e.to_string())),
            Err(_) => {
                return Err(LoggerError::connection_failed(
                    transport.name(),
                    format!("probe timed out after {:?}", PROBE_TIMEOUT),
                ));
            }
        }

        debug!(transport = transport.name(), "bulk sender connected");

        Ok(Self {
            transport,
            settings,
            closed: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> &SenderSettings {
        &self.settings
    }

    /// One bulk request for `entries`
    ///
    /// Fails on a non-success status and also when the response sets the
    /// batch-level `errors` flag, even if only some items failed.
    pub async fn send(&self, entries: &[LogEntry]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::ClientClosed);
        }
        if entries.is_empty() {
            return Ok(());
        }

        let payload = BulkPayload::build(
            entries,
            &self.settings.index_pattern,
            self.settings.compression,
        )?;
        let response = self.transport.bulk(payload).await?;

        if response.errors {
            let failed = response.failed_items().count();
            for item in response.failed_items() {
                debug!(
                    index = %item.index,
                    status = item.status,
                    error = ?item.error,
                    "bulk item failed"
                );
            }
            return Err(LoggerError::bulk_rejected(
                failed,
                entries.len(),
                response.first_failure(),
            ));
        }

        Ok(())
    }

    /// `send` plus up to `retry_count` retries with capped linear backoff
    ///
    /// Both the request and the backoff wait observe `cancel`; cancellation
    /// returns `Cancelled` immediately. Errors that cannot succeed on a retry
    /// are returned without waiting.
    pub async fn send_with_retry(&self, entries: &[LogEntry], cancel: &CancellationToken) -> Result<()> {
        let max_attempts = self.settings.retry_count.saturating_add(1);
        let mut attempt: u32 = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LoggerError::Cancelled),
                outcome = self.send(entries) => outcome,
            };

            let err = match outcome {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                error!(
                    attempts = attempt,
                    entries = entries.len(),
                    error = %err,
                    "bulk delivery failed, retries exhausted"
                );
                return Err(LoggerError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = retry_backoff(
                attempt,
                self.settings.retry_interval,
                self.settings.max_retry_backoff,
            );
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "bulk delivery failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LoggerError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Refuse further sends; the transport is released with the sender
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for BulkSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkSender")
            .field("transport", &self.transport.name())
            .field("settings", &self.settings)
            .field("closed", &self.is_closed())
            .finish()
    }
}
