//! Narrow interface for logging front ends

use super::{error::Result, fields::Fields, log_entry::LogEntry, log_level::LogLevel};
use async_trait::async_trait;

/// Capability a front end needs to hand entries to a shipper
///
/// Adapters for other logging facades implement against this trait instead
/// of the concrete client.
///
/// # Example
///
/// ```
/// use rust_log_shipper::{Fields, LogEntry, LogLevel, LogSink, Result};
/// use async_trait::async_trait;
/// use parking_lot::Mutex;
///
/// #[derive(Default)]
/// struct MemorySink {
///     entries: Mutex<Vec<LogEntry>>,
/// }
///
/// #[async_trait]
/// impl LogSink for MemorySink {
///     fn accept_entry(&self, entry: LogEntry) -> Result<()> {
///         self.entries.lock().push(entry);
///         Ok(())
///     }
///
///     fn flush(&self) {}
///
///     async fn sync(&self) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let sink = MemorySink::default();
/// sink.accept(LogLevel::Warn, "disk almost full".to_string(), Fields::new()).unwrap();
/// assert_eq!(sink.entries.lock()[0].level(), LogLevel::Warn);
/// ```
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Submit one record
    fn accept(&self, level: LogLevel, message: String, fields: Fields) -> Result<()> {
        self.accept_entry(LogEntry::new(level, message, fields))
    }

    /// Submit a record the front end already built
    fn accept_entry(&self, entry: LogEntry) -> Result<()>;

    /// Ask for buffered records to be delivered soon, without waiting
    fn flush(&self);

    /// Deliver everything buffered so far
    async fn sync(&self) -> Result<()>;
}
