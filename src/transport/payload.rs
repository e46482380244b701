//! NDJSON bulk payload construction
//!
//! Each entry becomes two lines: an `index` action naming the target index,
//! then the flattened document. The body can be gzip-compressed.

use super::index_pattern::IndexPattern;
use crate::core::{LogEntry, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::io::{Read, Write};

#[derive(Serialize)]
struct Action<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
}

/// Encoded request body for one bulk call
#[derive(Debug, Clone)]
pub struct BulkPayload {
    body: Vec<u8>,
    compressed: bool,
    entry_count: usize,
}

impl BulkPayload {
    /// Encode `entries`, resolving the index name of each one
    pub fn build(entries: &[LogEntry], pattern: &IndexPattern, compress: bool) -> Result<Self> {
        let mut ndjson = Vec::with_capacity(entries.len() * 256);
        for entry in entries {
            let index = pattern.resolve(entry.timestamp());
            serde_json::to_writer(&mut ndjson, &Action {
                index: ActionMeta { index: &index },
            })?;
            ndjson.push(b'\n');
            serde_json::to_writer(&mut ndjson, &entry.to_document())?;
            ndjson.push(b'\n');
        }

        let body = if compress {
            let mut encoder = GzEncoder::new(Vec::with_capacity(ndjson.len() / 4), Compression::fast());
            encoder.write_all(&ndjson)?;
            encoder.finish()?
        } else {
            ndjson
        };

        Ok(Self {
            body,
            compressed: compress,
            entry_count: entries.len(),
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// The uncompressed NDJSON text
    pub fn decoded(&self) -> Result<Vec<u8>> {
        if !self.compressed {
            return Ok(self.body.clone());
        }
        let mut plain = Vec::new();
        GzDecoder::new(self.body.as_slice()).read_to_end(&mut plain)?;
        Ok(plain)
    }
}
