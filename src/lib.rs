//! # Rust Log Shipper
//!
//! Buffered, batching delivery of structured log entries to
//! Elasticsearch-compatible bulk endpoints.
//!
//! ## Features
//!
//! - **Non-blocking ingestion**: bounded queue with discard or bounded-wait overflow
//! - **Batching**: size- and age-triggered flushes from a worker pool
//! - **Reliable delivery**: capped linear retry backoff under a per-flush deadline
//! - **Observability**: lock-free delivery metrics and `tracing` diagnostics
//!
//! ## Example
//!
//! ```no_run
//! use rust_log_shipper::prelude::*;
//! use rust_log_shipper::{fields, info};
//!
//! # async fn run() -> rust_log_shipper::Result<()> {
//! let client = Client::builder()
//!     .addresses(["http://localhost:9200"])
//!     .service_name("api")
//!     .build()
//!     .await?;
//!
//! info!(client, fields = fields! { "status" => 200 }; "GET /health took {}ms", 3)?;
//! println!("{:?}", client.metrics());
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod core;
pub mod macros;
pub mod transport;

pub mod prelude {
    pub use crate::client::{Client, ClientBuilder, ClientState};
    pub use crate::core::{
        Config, FieldValue, Fields, LogEntry, LogLevel, LogSink, LoggerError, MetricsSnapshot,
        OverflowPolicy, Result,
    };
}

pub use crate::client::{Client, ClientBuilder, ClientState, FLUSH_DEADLINE};
pub use crate::core::{
    Batch, Config, FieldValue, Fields, HostInfo, LogEntry, LogLevel, LogSink, LoggerError,
    Metrics, MetricsSnapshot, OverflowPolicy, Result, QUEUE_FULL_TIMEOUT,
};
