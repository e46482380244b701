//! Stress tests for concurrent ingestion
//!
//! These tests verify:
//! - No entry is lost or duplicated with many producers in blocking mode
//! - Delivered plus dropped equals accepted in discard mode under pressure
//! - Per-producer order survives a single worker
//! - Entries accepted while `close` runs are still delivered

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_log_shipper::prelude::*;
use rust_log_shipper::transport::{BulkPayload, BulkResponse, BulkTransport};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Endpoint that keeps every delivered message, optionally slowly
struct CollectingTransport {
    messages: Mutex<Vec<String>>,
    latency: Duration,
}

impl CollectingTransport {
    fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            latency,
        })
    }
}

#[async_trait]
impl BulkTransport for CollectingTransport {
    async fn ping(&self) -> rust_log_shipper::Result<()> {
        Ok(())
    }

    async fn bulk(&self, payload: BulkPayload) -> rust_log_shipper::Result<BulkResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let body = String::from_utf8(payload.decoded()?).unwrap();
        let mut messages = self.messages.lock();
        for line in body.lines().skip(1).step_by(2) {
            let doc: serde_json::Value = serde_json::from_str(line).unwrap();
            messages.push(doc["message"].as_str().unwrap().to_string());
        }
        Ok(BulkResponse::accepted())
    }

    fn name(&self) -> &str {
        "collecting"
    }
}

async fn start(transport: Arc<CollectingTransport>, builder: ClientBuilder) -> Arc<Client> {
    let client = builder
        .shared_transport(transport)
        .enable_host_info(false)
        .enable_compression(false)
        .flush_interval(Duration::from_millis(20))
        .batch_timeout(Duration::from_millis(20))
        .build()
        .await
        .unwrap();
    Arc::new(client)
}

fn produce(client: &Arc<Client>, producers: usize, per_producer: usize) -> Vec<Result<()>> {
    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let client = Arc::clone(client);
            thread::spawn(move || {
                (0..per_producer)
                    .map(|i| client.info(format!("p{}-{}", p, i), Fields::new()))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_producers_lose_nothing() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 1_000;

    let transport = CollectingTransport::new(Duration::ZERO);
    let client = start(
        Arc::clone(&transport),
        Client::builder().batch_size(100).queue_size(1_000),
    )
    .await;

    let producer_client = Arc::clone(&client);
    let results = tokio::task::spawn_blocking(move || {
        produce(&producer_client, PRODUCERS, PER_PRODUCER)
    })
    .await
    .unwrap();
    assert!(results.iter().all(|r| r.is_ok()));

    client.close().await.unwrap();

    let messages = transport.messages.lock();
    let unique: HashSet<&String> = messages.iter().collect();
    assert_eq!(messages.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(unique.len(), PRODUCERS * PER_PRODUCER);

    let metrics = client.metrics();
    assert_eq!(metrics.total_logs, (PRODUCERS * PER_PRODUCER) as u64);
    assert_eq!(metrics.dropped_logs, 0);
    assert_eq!(metrics.failed_logs, 0);
    assert!(metrics.success_logs >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_discard_mode_accounts_for_every_entry() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 2_000;

    let transport = CollectingTransport::new(Duration::from_millis(2));
    let client = start(
        Arc::clone(&transport),
        Client::builder()
            .batch_size(10)
            .queue_size(10)
            .worker_count(1)
            .discard_on_full(true),
    )
    .await;

    let producer_client = Arc::clone(&client);
    let results = tokio::task::spawn_blocking(move || {
        produce(&producer_client, PRODUCERS, PER_PRODUCER)
    })
    .await
    .unwrap();
    assert!(results.iter().all(|r| r.is_ok()));

    client.close().await.unwrap();

    let delivered = transport.messages.lock().len() as u64;
    let metrics = client.metrics();
    assert_eq!(metrics.total_logs, (PRODUCERS * PER_PRODUCER) as u64);
    assert_eq!(delivered + metrics.dropped_logs, metrics.total_logs);
    assert!(metrics.dropped_logs > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_worker_preserves_producer_order() {
    let transport = CollectingTransport::new(Duration::ZERO);
    let client = start(
        Arc::clone(&transport),
        Client::builder().batch_size(7).worker_count(1),
    )
    .await;

    for i in 0..500 {
        client.debug(format!("{}", i), Fields::new()).unwrap();
    }
    client.close().await.unwrap();

    let sequence: Vec<u32> = transport
        .messages
        .lock()
        .iter()
        .map(|m| m.parse().unwrap())
        .collect();
    assert_eq!(sequence, (0..500).collect::<Vec<u32>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_producers_delivers_every_accepted_entry() {
    const PRODUCERS: usize = 4;

    let transport = CollectingTransport::new(Duration::ZERO);
    let client = start(
        Arc::clone(&transport),
        Client::builder().batch_size(50).queue_size(500),
    )
    .await;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                let mut accepted = 0u64;
                for i in 0..1_000_000 {
                    match client.info(format!("p{}-{}", p, i), Fields::new()) {
                        Ok(()) => accepted += 1,
                        Err(LoggerError::ClientClosed) => break,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                accepted
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(30)).await;
    client.close().await.unwrap();

    let accepted: u64 = tokio::task::spawn_blocking(move || {
        producers.into_iter().map(|h| h.join().unwrap()).sum()
    })
    .await
    .unwrap();

    let delivered = transport.messages.lock().len() as u64;
    let metrics = client.metrics();
    assert!(accepted > 0);
    assert_eq!(delivered, accepted);
    assert_eq!(metrics.total_logs, accepted);
    assert_eq!(metrics.dropped_logs, 0);
    assert_eq!(client.queued(), 0);
}
