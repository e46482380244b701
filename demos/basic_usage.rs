//! Basic shipper usage example
//!
//! Ships a handful of entries to an Elasticsearch-compatible endpoint and
//! prints the delivery metrics.
//!
//! Run with: ES_URL=http://localhost:9200 cargo run --example basic_usage

use rust_log_shipper::prelude::*;
use rust_log_shipper::{error, fields, info};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rust_log_shipper=debug")),
        )
        .init();

    let address = std::env::var("ES_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
    println!("=== Rust Log Shipper - Basic Usage Example ===\n");
    println!("Shipping to {}", address);

    let client = Client::builder()
        .addresses([address])
        .index_pattern("demo-logs-{date}")
        .service_name("basic-usage")
        .environment("demo")
        .batch_size(10)
        .flush_interval(Duration::from_secs(1))
        .build()
        .await?;

    println!("\n1. Level wrappers:");
    client.debug("cache warmed", Fields::new())?;
    client.info("service started", fields! { "port" => 8080 })?;
    client.warn("slow dependency", fields! { "dependency" => "billing", "ms" => 870 })?;

    println!("2. Macros with formatting and fields:");
    for order in 0..5 {
        info!(client, fields = fields! { "order_id" => order }; "order {} accepted", order)?;
    }
    error!(client, "payment gateway returned {}", 502)?;

    println!("3. Explicit flush:");
    tokio::time::sleep(Duration::from_millis(50)).await;
    match client.flush().await {
        Ok(sent) => println!("   flushed {} entries", sent),
        Err(e) => println!("   flush failed: {}", e),
    }

    client.close().await?;

    let metrics = client.metrics();
    println!("\nMetrics: {}", serde_json::to_string_pretty(&metrics)?);
    println!("Drop rate: {:.2}%", metrics.drop_rate());
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
