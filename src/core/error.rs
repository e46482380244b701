//! Error types for the log shipper

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Queue stayed full for the whole blocking window
    #[error("Log queue full: {capacity} entries buffered, gave up after {waited:?}")]
    QueueFull { capacity: usize, waited: Duration },

    /// Client is closing or closed
    #[error("Log client is closed")]
    ClientClosed,

    /// Connectivity probe failed during construction
    #[error("Failed to connect to bulk endpoint '{address}': {message}")]
    ConnectionFailed { address: String, message: String },

    /// Network-level failure talking to an endpoint
    #[error("Transport error for '{address}': {source}")]
    Transport {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success status
    #[error("Bulk request returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Endpoint accepted the request but flagged item errors
    #[error("Bulk request has errors: {failed}/{total} items failed ({reason})")]
    BulkRejected {
        failed: usize,
        total: usize,
        reason: String,
    },

    /// Endpoint answered with a success status but an unreadable body
    #[error("Invalid bulk response from '{address}': {source}")]
    InvalidResponse {
        address: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic IO error (request body compression)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delivery was cancelled while waiting
    #[error("Delivery cancelled")]
    Cancelled,

    /// Per-flush deadline elapsed
    #[error("Delivery deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Every attempt failed
    #[error("Failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<LoggerError>,
    },
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(capacity: usize, waited: Duration) -> Self {
        LoggerError::QueueFull { capacity, waited }
    }

    /// Create a connection failure error
    pub fn connection_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ConnectionFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(address: impl Into<String>, source: reqwest::Error) -> Self {
        LoggerError::Transport {
            address: address.into(),
            source,
        }
    }

    /// Create a bulk rejection error
    pub fn bulk_rejected(failed: usize, total: usize, reason: impl Into<String>) -> Self {
        LoggerError::BulkRejected {
            failed,
            total,
            reason: reason.into(),
        }
    }

    /// Whether another delivery attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoggerError::Transport { .. }
                | LoggerError::HttpStatus { .. }
                | LoggerError::BulkRejected { .. }
                | LoggerError::InvalidResponse { .. }
                | LoggerError::Io(_)
        )
    }
}
