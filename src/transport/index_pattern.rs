//! Per-entry index name resolution

use chrono::{DateTime, Utc};

/// Index name template with date placeholders
///
/// Supported tokens: `{date}` (`YYYY.MM.DD`), `{year}`, `{month}` and `{day}`
/// (zero-padded). Tokens are substituted from each entry's own timestamp, in
/// UTC, so one batch may target several indices.
///
/// # Example
///
/// ```
/// use rust_log_shipper::transport::IndexPattern;
/// use chrono::{TimeZone, Utc};
///
/// let pattern = IndexPattern::new("logs-{date}");
/// let ts = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
/// assert_eq!(pattern.resolve(ts), "logs-2024.01.05");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPattern {
    template: String,
    has_tokens: bool,
}

impl IndexPattern {
    const TOKENS: [&'static str; 4] = ["{date}", "{year}", "{month}", "{day}"];

    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let has_tokens = Self::TOKENS.iter().any(|t| template.contains(t));
        Self {
            template,
            has_tokens,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Index name for an entry created at `timestamp`
    pub fn resolve(&self, timestamp: DateTime<Utc>) -> String {
        if !self.has_tokens {
            return self.template.clone();
        }
        self.template
            .replace("{date}", &timestamp.format("%Y.%m.%d").to_string())
            .replace("{year}", &timestamp.format("%Y").to_string())
            .replace("{month}", &timestamp.format("%m").to_string())
            .replace("{day}", &timestamp.format("%d").to_string())
    }
}

impl From<&str> for IndexPattern {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}
