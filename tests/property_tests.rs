//! Property-based tests for rust_log_shipper using proptest

use chrono::{Datelike, TimeZone, Utc};
use proptest::prelude::*;
use rust_log_shipper::prelude::*;
use rust_log_shipper::transport::{retry_backoff, BulkPayload, IndexPattern};
use rust_log_shipper::{Batch, Metrics};
use std::time::Duration;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names roundtrip through parsing, in any case
    #[test]
    fn test_log_level_str_roundtrip(level in any_level(), upper in any::<bool>()) {
        let name = if upper { level.as_str().to_uppercase() } else { level.as_str().to_string() };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(parsed, level);
        prop_assert_eq!(level.to_string(), level.as_str());
    }

    /// Ordering follows severity
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
    }
}

// ============================================================================
// Batch Tests
// ============================================================================

proptest! {
    /// `add` signals exactly when the size reaches the threshold
    #[test]
    fn test_batch_threshold(max in 1usize..50, adds in 0usize..120) {
        let batch = Batch::new(max, Duration::from_secs(60));
        for i in 1..=adds {
            let full = batch.add(LogEntry::new(LogLevel::Info, format!("{}", i), Fields::new()));
            prop_assert_eq!(full, i >= max);
        }
        prop_assert_eq!(batch.len(), adds);

        let taken = batch.flush();
        prop_assert_eq!(taken.len(), adds);
        prop_assert!(batch.is_empty());
        prop_assert!(batch.flush().is_empty());
    }
}

// ============================================================================
// Retry Backoff Tests
// ============================================================================

proptest! {
    /// Backoff is linear in the attempt number and never exceeds the cap
    #[test]
    fn test_backoff_capped(attempt in 1u32..1_000, interval_ms in 1u64..5_000, max_ms in 1u64..60_000) {
        let interval = Duration::from_millis(interval_ms);
        let max = Duration::from_millis(max_ms);
        let delay = retry_backoff(attempt, interval, max);

        prop_assert!(delay <= max);
        prop_assert_eq!(delay, (interval * attempt).min(max));
        prop_assert!(retry_backoff(attempt + 1, interval, max) >= delay);
    }
}

// ============================================================================
// Index Pattern Tests
// ============================================================================

proptest! {
    /// `{date}` always expands to the entry's own UTC date
    #[test]
    fn test_index_pattern_date(secs in 0i64..4_102_444_800, prefix in "[a-z]{1,8}") {
        let ts = Utc.timestamp_opt(secs, 0).unwrap();
        let pattern = IndexPattern::new(format!("{}-{{date}}", prefix));
        let expected = format!("{}-{:04}.{:02}.{:02}", prefix, ts.year(), ts.month(), ts.day());
        prop_assert_eq!(pattern.resolve(ts), expected);
    }

    /// Templates without tokens are used verbatim
    #[test]
    fn test_index_pattern_static(name in "[a-z_-]{1,20}", secs in 0i64..4_102_444_800) {
        let ts = Utc.timestamp_opt(secs, 0).unwrap();
        prop_assert_eq!(IndexPattern::new(name.clone()).resolve(ts), name);
    }
}

// ============================================================================
// Document and Payload Tests
// ============================================================================

proptest! {
    /// Custom fields win over built-in keys of the same name
    #[test]
    fn test_custom_fields_override(message in ".*", custom in "[a-zA-Z0-9 ]{0,32}") {
        let entry = LogEntry::new(
            LogLevel::Info,
            message,
            Fields::new().with_field("message", custom.clone()),
        );
        let doc = entry.to_document();
        prop_assert_eq!(doc["message"].as_str().unwrap(), custom.as_str());
    }

    /// Every entry becomes exactly two newline-terminated lines
    #[test]
    fn test_payload_line_count(messages in prop::collection::vec(".*", 0..20), compress in any::<bool>()) {
        let entries: Vec<LogEntry> = messages
            .iter()
            .map(|m| LogEntry::new(LogLevel::Warn, m.clone(), Fields::new()))
            .collect();
        let payload = BulkPayload::build(&entries, &IndexPattern::new("logs"), compress).unwrap();
        let plain = payload.decoded().unwrap();
        let text = String::from_utf8(plain).unwrap();

        prop_assert_eq!(text.matches('\n').count(), entries.len() * 2);
        prop_assert!(text.is_empty() || text.ends_with('\n'));
    }
}

// ============================================================================
// Metrics Tests
// ============================================================================

proptest! {
    /// Average latency is the truncated mean in milliseconds
    #[test]
    fn test_avg_latency(samples in prop::collection::vec(0u64..10_000, 0..50)) {
        let metrics = Metrics::new();
        for ms in &samples {
            metrics.record_latency(Duration::from_millis(*ms));
        }
        let expected = if samples.is_empty() {
            0
        } else {
            samples.iter().sum::<u64>() / samples.len() as u64
        };
        prop_assert_eq!(metrics.avg_latency_ms(), expected);
    }
}

// ============================================================================
// Config Tests
// ============================================================================

proptest! {
    /// Any positive sizing is accepted; zero in any of them is rejected
    #[test]
    fn test_config_sizes(batch in 0usize..5, queue in 0usize..5, workers in 0usize..5) {
        let config = Config {
            batch_size: batch,
            queue_size: queue,
            worker_count: workers,
            ..Config::default()
        };
        prop_assert_eq!(config.validate().is_ok(), batch > 0 && queue > 0 && workers > 0);
    }
}
