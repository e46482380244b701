//! Client configuration and one-shot validation

use super::error::{LoggerError, Result};
use super::overflow_policy::{OverflowPolicy, QUEUE_FULL_TIMEOUT};
use std::time::Duration;
use url::Url;

/// Tunables fixed when a [`Client`](crate::Client) is constructed
///
/// # Example
///
/// ```
/// use rust_log_shipper::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     addresses: vec!["http://es-1:9200".to_string(), "http://es-2:9200".to_string()],
///     index_pattern: "app-logs-{year}.{month}".to_string(),
///     batch_size: 500,
///     batch_timeout: Duration::from_secs(2),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Bulk endpoint base URLs, used in rotation
    pub addresses: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Index name template, see [`IndexPattern`](crate::transport::IndexPattern)
    pub index_pattern: String,

    /// Entries per batch before an immediate flush
    pub batch_size: usize,
    /// Maximum age of a non-empty batch
    pub batch_timeout: Duration,
    /// How often the flusher checks the batch age
    pub flush_interval: Duration,

    pub queue_size: usize,
    pub worker_count: usize,

    /// Retries after the first attempt
    pub retry_count: u32,
    pub retry_interval: Duration,
    pub max_retry_backoff: Duration,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,

    pub service_name: String,
    pub environment: String,
    pub enable_host_info: bool,
    pub enable_compression: bool,
    /// Drop instead of blocking when the queue is full
    pub discard_on_full: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addresses: vec!["http://localhost:9200".to_string()],
            username: None,
            password: None,
            index_pattern: "logs-{date}".to_string(),
            batch_size: 100,
            batch_timeout: Duration::from_secs(5),
            flush_interval: Duration::from_secs(10),
            queue_size: 10_000,
            worker_count: 4,
            retry_count: 3,
            retry_interval: Duration::from_secs(1),
            max_retry_backoff: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            service_name: "unknown-service".to_string(),
            environment: "development".to_string(),
            enable_host_info: true,
            enable_compression: true,
            discard_on_full: false,
        }
    }
}

impl Config {
    /// Check every invariant; the first violation is returned
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(LoggerError::config("addresses", "cannot be empty"));
        }
        for address in &self.addresses {
            let url = Url::parse(address).map_err(|e| {
                LoggerError::config("addresses", format!("'{}' is not a valid URL: {}", address, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoggerError::config(
                    "addresses",
                    format!("'{}' must use http or https", address),
                ));
            }
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config("batch_size", "must be greater than 0"));
        }
        if self.queue_size == 0 {
            return Err(LoggerError::config("queue_size", "must be greater than 0"));
        }
        if self.worker_count == 0 {
            return Err(LoggerError::config("worker_count", "must be greater than 0"));
        }
        if self.flush_interval.is_zero() {
            return Err(LoggerError::config("flush_interval", "must be greater than 0"));
        }
        if self.username.is_none() && self.password.is_some() {
            return Err(LoggerError::config("username", "required when a password is set"));
        }
        Ok(())
    }

    /// Queue-full behavior implied by `discard_on_full`
    pub fn overflow_policy(&self) -> OverflowPolicy {
        if self.discard_on_full {
            OverflowPolicy::Discard
        } else {
            OverflowPolicy::BlockWithTimeout(QUEUE_FULL_TIMEOUT)
        }
    }
}
