//! Pending-entry accumulator shared by the worker pool

use super::log_entry::LogEntry;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct Pending {
    entries: Vec<LogEntry>,
    last_flush: Instant,
}

/// Mutex-guarded batch with size- and age-based flush signals
///
/// `flush` swaps the pending entries out under the lock, so concurrent
/// callers never receive the same entry twice.
pub struct Batch {
    pending: Mutex<Pending>,
    max_size: usize,
    max_age: Duration,
}

impl Batch {
    pub fn new(max_size: usize, max_age: Duration) -> Self {
        Self {
            pending: Mutex::new(Pending {
                entries: Vec::with_capacity(max_size),
                last_flush: Instant::now(),
            }),
            max_size,
            max_age,
        }
    }

    /// Append an entry; returns true once the size threshold is reached
    pub fn add(&self, entry: LogEntry) -> bool {
        let mut pending = self.pending.lock();
        pending.entries.push(entry);
        pending.entries.len() >= self.max_size
    }

    /// True when entries are pending and the batch is older than its max age
    pub fn should_flush(&self) -> bool {
        let pending = self.pending.lock();
        !pending.entries.is_empty() && pending.last_flush.elapsed() >= self.max_age
    }

    /// Take every pending entry, leaving the batch empty
    pub fn flush(&self) -> Vec<LogEntry> {
        let mut pending = self.pending.lock();
        if pending.entries.is_empty() {
            return Vec::new();
        }
        pending.last_flush = Instant::now();
        std::mem::replace(&mut pending.entries, Vec::with_capacity(self.max_size))
    }

    /// Discard pending entries; returns how many were thrown away
    pub fn clear(&self) -> usize {
        let mut pending = self.pending.lock();
        let discarded = pending.entries.len();
        pending.entries = Vec::with_capacity(self.max_size);
        pending.last_flush = Instant::now();
        discarded
    }

    pub fn len(&self) -> usize {
        self.pending.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .field("max_age", &self.max_age)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fields, LogLevel};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn entry(i: usize) -> LogEntry {
        LogEntry::new(LogLevel::Info, format!("message {}", i), Fields::new())
    }

    #[test]
    fn test_add_signals_at_max_size() {
        let batch = Batch::new(3, Duration::from_secs(60));

        assert!(!batch.add(entry(0)));
        assert!(!batch.add(entry(1)));
        assert!(batch.add(entry(2)));
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_flush_is_destructive() {
        let batch = Batch::new(10, Duration::from_secs(60));
        batch.add(entry(0));
        batch.add(entry(1));

        let first = batch.flush();
        let second = batch.flush();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].message(), "message 0");
        assert!(second.is_empty());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_should_flush_never_true_when_empty() {
        let batch = Batch::new(10, Duration::ZERO);
        assert!(!batch.should_flush());

        batch.add(entry(0));
        assert!(batch.should_flush());
    }

    #[test]
    fn test_should_flush_waits_for_max_age() {
        let batch = Batch::new(10, Duration::from_millis(50));
        batch.add(entry(0));
        assert!(!batch.should_flush());

        std::thread::sleep(Duration::from_millis(60));
        assert!(batch.should_flush());

        batch.flush();
        batch.add(entry(1));
        assert!(!batch.should_flush(), "flush must reset the age");
    }

    #[test]
    fn test_clear_discards() {
        let batch = Batch::new(10, Duration::from_secs(60));
        batch.add(entry(0));
        batch.add(entry(1));

        assert_eq!(batch.clear(), 2);
        assert!(batch.flush().is_empty());
    }

    #[test]
    fn test_concurrent_flush_never_duplicates() {
        let batch = Arc::new(Batch::new(1_000_000, Duration::from_secs(60)));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let batch = Arc::clone(&batch);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        batch.add(entry(p * 1_000 + i));
                    }
                })
            })
            .collect();
        let flushers: Vec<_> = (0..3)
            .map(|_| {
                let batch = Arc::clone(&batch);
                std::thread::spawn(move || {
                    let mut seen = Vec::new();
                    for _ in 0..200 {
                        seen.extend(batch.flush().into_iter().map(|e| e.message().to_string()));
                    }
                    seen
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        let mut all: Vec<String> = flushers
            .into_iter()
            .flat_map(|f| f.join().unwrap())
            .collect();
        all.extend(batch.flush().into_iter().map(|e| e.message().to_string()));

        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), 2_000);
        assert_eq!(unique.len(), 2_000);
    }
}
