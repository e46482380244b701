//! Logging macros for ergonomic message formatting.
//!
//! The level macros take the client first, then an optional
//! `fields = <expr>;` prefix, then `format!` arguments. They return the
//! client's `Result<()>`.
//!
//! # Examples
//!
//! ```no_run
//! use rust_log_shipper::prelude::*;
//! use rust_log_shipper::{error, fields, info};
//!
//! # async fn run() -> rust_log_shipper::Result<()> {
//! let client = Client::builder().build().await?;
//!
//! // Basic logging
//! info!(client, "Server started")?;
//!
//! // With format arguments
//! let port = 8080;
//! info!(client, "Server listening on port {}", port)?;
//!
//! // With structured fields
//! let user_id = 42;
//! error!(client, fields = fields! { "user_id" => user_id }; "login failed for {}", user_id)?;
//! # Ok(())
//! # }
//! ```

/// Build a [`Fields`](crate::Fields) map from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use rust_log_shipper::{fields, FieldValue};
///
/// let fields = fields! { "user" => "alice", "attempts" => 3, "admin" => false };
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields.get("attempts"), Some(&FieldValue::Int(3)));
///
/// let empty = fields! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert($key, $value);
        )+
        fields
    }};
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```no_run
/// # use rust_log_shipper::prelude::*;
/// # async fn run(client: Client) -> rust_log_shipper::Result<()> {
/// use rust_log_shipper::{fields, log};
/// log!(client, LogLevel::Info, "Simple message")?;
/// log!(client, LogLevel::Error, "Error code: {}", 500)?;
/// log!(client, LogLevel::Warn, fields = fields! { "retry" => true }; "slow upstream")?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! log {
    ($client:expr, $level:expr, fields = $fields:expr; $($arg:tt)+) => {
        $client.log($level, format!($($arg)+), $fields)
    };
    ($client:expr, $level:expr, $($arg:tt)+) => {
        $client.log($level, format!($($arg)+), $crate::Fields::new())
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($client:expr, $($arg:tt)+) => {
        $crate::log!($client, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```no_run
/// # use rust_log_shipper::prelude::*;
/// # async fn run(client: Client) -> rust_log_shipper::Result<()> {
/// use rust_log_shipper::info;
/// info!(client, "Application started")?;
/// info!(client, "Processing {} items", 100)?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! info {
    ($client:expr, $($arg:tt)+) => {
        $crate::log!($client, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($client:expr, $($arg:tt)+) => {
        $crate::log!($client, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($client:expr, $($arg:tt)+) => {
        $crate::log!($client, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// Only records the entry; the process keeps running.
#[macro_export]
macro_rules! fatal {
    ($client:expr, $($arg:tt)+) => {
        $crate::log!($client, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::{FieldValue, Fields, LogLevel, Result};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(LogLevel, String, Fields)>>,
    }

    impl Recorder {
        fn log(&self, level: LogLevel, message: String, fields: Fields) -> Result<()> {
            self.calls.lock().push((level, message, fields));
            Ok(())
        }
    }

    #[test]
    fn test_level_macros_format_messages() {
        let recorder = Recorder::default();
        crate::debug!(recorder, "plain").unwrap();
        crate::info!(recorder, "value {}", 42).unwrap();
        crate::warn!(recorder, "{} and {}", "a", "b").unwrap();
        crate::error!(recorder, "error code {}", 500).unwrap();
        crate::fatal!(recorder, "bye").unwrap();

        let calls = recorder.calls.lock();
        let levels: Vec<LogLevel> = calls.iter().map(|c| c.0).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
        assert_eq!(calls[1].1, "value 42");
        assert_eq!(calls[2].1, "a and b");
        assert!(calls.iter().all(|c| c.2.is_empty()));
    }

    #[test]
    fn test_fields_prefix() {
        let recorder = Recorder::default();
        crate::info!(
            recorder,
            fields = crate::fields! { "user" => "alice", "ok" => true };
            "login by {}",
            "alice"
        )
        .unwrap();

        let calls = recorder.calls.lock();
        assert_eq!(calls[0].1, "login by alice");
        assert_eq!(calls[0].2.get("ok"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn test_fields_macro_trailing_comma() {
        let fields = crate::fields! { "a" => 1_i64, "b" => "two", };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("b"), Some(&FieldValue::String("two".to_string())));
    }
}
