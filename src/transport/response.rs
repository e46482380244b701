//! Bulk API response model

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parsed body of a bulk response
///
/// `errors` is the batch-level flag; when it is true the whole batch is
/// treated as failed, whatever the per-item details say.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub errors: bool,
    /// One map per document, keyed by action name (`index`, `create`, ...)
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

impl BulkResponse {
    /// A response accepting every document
    pub fn accepted() -> Self {
        Self::default()
    }

    /// A response flagging the batch with one failed item
    pub fn rejected(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        let item = BulkItem {
            status: 400,
            error: Some(BulkItemError {
                kind: kind.into(),
                reason: reason.into(),
            }),
            ..Default::default()
        };
        Self {
            took: 0,
            errors: true,
            items: vec![HashMap::from([("index".to_string(), item)])],
        }
    }

    /// Items that carry an error or a non-2xx status
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItem> {
        self.items
            .iter()
            .flat_map(|item| item.values())
            .filter(|item| item.error.is_some() || !(200..300).contains(&item.status))
    }

    /// Short description of the first item failure, for error messages
    pub fn first_failure(&self) -> String {
        self.failed_items()
            .next()
            .map(|item| match &item.error {
                Some(err) => format!("{}: {}", err.kind, err.reason),
                None => format!("status {}", item.status),
            })
            .unwrap_or_else(|| "errors flag set".to_string())
    }
}
