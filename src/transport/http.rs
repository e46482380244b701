//! HTTP transport for Elasticsearch-compatible bulk endpoints
//!
//! Sends NDJSON payloads to `{address}/_bulk` with reqwest. Addresses from
//! the configuration are used in rotation, one per request.

use super::payload::BulkPayload;
use super::response::BulkResponse;
use crate::core::{Config, LoggerError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Longest response body kept in an `HttpStatus` error
const MAX_ERROR_BODY: usize = 512;

/// Protocol-level seam between the sender and the network
///
/// # Example
///
/// ```
/// use rust_log_shipper::transport::{BulkPayload, BulkResponse, BulkTransport};
/// use rust_log_shipper::Result;
/// use async_trait::async_trait;
///
/// struct DiscardTransport;
///
/// #[async_trait]
/// impl BulkTransport for DiscardTransport {
///     async fn ping(&self) -> Result<()> {
///         Ok(())
///     }
///
///     async fn bulk(&self, _payload: BulkPayload) -> Result<BulkResponse> {
///         Ok(BulkResponse::accepted())
///     }
///
///     fn name(&self) -> &str {
///         "discard"
///     }
/// }
/// ```
#[async_trait]
pub trait BulkTransport: Send + Sync {
    /// Connectivity probe
    async fn ping(&self) -> Result<()>;

    /// Issue one bulk request; non-success HTTP statuses are errors
    async fn bulk(&self, payload: BulkPayload) -> Result<BulkResponse>;

    fn name(&self) -> &str;
}

/// reqwest-backed bulk transport
pub struct HttpTransport {
    client: Client,
    addresses: Vec<String>,
    username: Option<String>,
    password: Option<String>,
    next: AtomicUsize,
}

impl HttpTransport {
    /// Build the HTTP client from the addresses, credentials and request timeout
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the address list is empty or the
    /// HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.addresses.is_empty() {
            return Err(LoggerError::config("addresses", "cannot be empty"));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoggerError::config("http_client", e.to_string()))?;

        let addresses: Vec<String> = config
            .addresses
            .iter()
            .map(|a| a.trim_end_matches('/').to_string())
            .collect();

        info!(addresses = ?addresses, "bulk HTTP transport initialized");

        Ok(Self {
            client,
            addresses,
            username: config.username.clone(),
            password: config.password.clone(),
            next: AtomicUsize::new(0),
        })
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Address for the next request, rotating through the list
    fn next_address(&self) -> &str {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        &self.addresses[idx]
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait]
impl BulkTransport for HttpTransport {
    async fn ping(&self) -> Result<()> {
        let mut last_failure = String::from("no address answered");

        for address in &self.addresses {
            let request = self.authorize(self.client.head(format!("{}/", address)));
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(address = %address, "bulk endpoint reachable");
                    return Ok(());
                }
                Ok(response) => {
                    last_failure = format!("{} returned {}", address, response.status());
                }
                Err(e) => {
                    last_failure = format!("{}: {}", address, e);
                }
            }
        }

        Err(LoggerError::connection_failed(
            self.addresses.join(","),
            last_failure,
        ))
    }

    async fn bulk(&self, payload: BulkPayload) -> Result<BulkResponse> {
        let address = self.next_address();
        let url = format!("{}/_bulk", address);

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-ndjson");
        if payload.is_compressed() {
            request = request.header(CONTENT_ENCODING, "gzip");
        }
        let request = self.authorize(request).body(payload.into_body());

        let response = request
            .send()
            .await
            .map_err(|e| LoggerError::transport(address, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoggerError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoggerError::transport(address, e))?;
        serde_json::from_slice(&bytes).map_err(|source| LoggerError::InvalidResponse {
            address: address.to_string(),
            source,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("addresses", &self.addresses)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
