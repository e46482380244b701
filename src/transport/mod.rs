//! Delivery to Elasticsearch-compatible bulk endpoints

pub mod http;
pub mod index_pattern;
pub mod payload;
pub mod response;
pub mod sender;

pub use http::{BulkTransport, HttpTransport};
pub use index_pattern::IndexPattern;
pub use payload::BulkPayload;
pub use response::{BulkItem, BulkItemError, BulkResponse};
pub use sender::{retry_backoff, BulkSender, SenderSettings, PROBE_TIMEOUT};
