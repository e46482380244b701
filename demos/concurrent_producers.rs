//! Concurrent producers example
//!
//! Many threads log through one shared client. Delivery goes to an
//! in-process transport, so no endpoint is needed; swap in the default HTTP
//! transport to ship for real.
//!
//! Run with: cargo run --example concurrent_producers

use async_trait::async_trait;
use rust_log_shipper::prelude::*;
use rust_log_shipper::transport::{BulkPayload, BulkResponse, BulkTransport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Counts what it receives and answers like a healthy endpoint
#[derive(Default)]
struct CountingTransport {
    requests: AtomicUsize,
    entries: AtomicUsize,
}

#[async_trait]
impl BulkTransport for CountingTransport {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn bulk(&self, payload: BulkPayload) -> Result<BulkResponse> {
        // Simulated network round trip
        tokio::time::sleep(Duration::from_millis(3)).await;
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.entries.fetch_add(payload.entry_count(), Ordering::Relaxed);
        Ok(BulkResponse::accepted())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Rust Log Shipper - Concurrent Producers Example ===\n");

    let transport = Arc::new(CountingTransport::default());
    let client = Arc::new(
        Client::builder()
            .shared_transport(transport.clone())
            .batch_size(250)
            .queue_size(2_000)
            .worker_count(4)
            .discard_on_full(std::env::args().any(|a| a == "--discard"))
            .enable_host_info(false)
            .build()
            .await?,
    );

    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 25_000;

    let started = Instant::now();
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                let mut rejected = 0;
                for i in 0..PER_PRODUCER {
                    let fields = Fields::new()
                        .with_field("producer", p)
                        .with_field("seq", i);
                    if client.info(format!("event {}", i), fields).is_err() {
                        rejected += 1;
                    }
                }
                rejected
            })
        })
        .collect();

    let mut rejected = 0;
    for producer in producers {
        rejected += producer.join().unwrap_or(0);
    }
    let produced_in = started.elapsed();

    client.close().await?;

    let metrics = client.metrics();
    println!("Produced {} entries in {:?}", PRODUCERS * PER_PRODUCER, produced_in);
    println!("Rejected by log(): {}", rejected);
    println!(
        "Delivered {} entries in {} requests",
        transport.entries.load(Ordering::Relaxed),
        transport.requests.load(Ordering::Relaxed)
    );
    println!(
        "total={} success_batches={} failed_batches={} dropped={} avg_latency_ms={}",
        metrics.total_logs,
        metrics.success_logs,
        metrics.failed_logs,
        metrics.dropped_logs,
        metrics.avg_latency_ms
    );
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
