//! Core data model: entries, batching, metrics and configuration

pub mod batch;
pub mod config;
pub mod error;
pub mod fields;
pub mod host;
pub mod log_entry;
pub mod log_level;
pub mod metrics;
pub mod overflow_policy;
pub mod sink;

pub use batch::Batch;
pub use config::Config;
pub use error::{LoggerError, Result};
pub use fields::{FieldValue, Fields};
pub use host::HostInfo;
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use metrics::{Metrics, MetricsSnapshot};
pub use overflow_policy::{OverflowPolicy, QUEUE_FULL_TIMEOUT};
pub use sink::LogSink;
