//! Criterion benchmarks for rust_log_shipper

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_log_shipper::prelude::*;
use rust_log_shipper::transport::{BulkPayload, IndexPattern};
use rust_log_shipper::{fields, Batch, Metrics};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn sample_entry(i: usize) -> LogEntry {
    LogEntry::new(
        LogLevel::Info,
        format!("request {} completed", i),
        fields! {
            "request_id" => i,
            "path" => "/api/v1/orders",
            "latency_ms" => 12.5,
            "cached" => false,
        },
    )
    .with_service("bench")
    .with_environment("production")
    .with_host(Some("bench-host".to_string()), Some("10.0.0.7".to_string()))
}

// ============================================================================
// Document Encoding Benchmarks
// ============================================================================

fn bench_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");
    group.throughput(Throughput::Elements(1));

    let entry = sample_entry(1);
    group.bench_function("to_document", |b| {
        b.iter(|| black_box(entry.to_document()));
    });
    group.bench_function("to_json", |b| {
        b.iter(|| black_box(entry.to_json().unwrap()));
    });

    group.finish();
}

// ============================================================================
// Bulk Payload Benchmarks
// ============================================================================

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_payload");
    let pattern = IndexPattern::new("logs-{date}");

    for size in [10usize, 100, 1_000] {
        let entries: Vec<LogEntry> = (0..size).map(sample_entry).collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("plain", size), &entries, |b, entries| {
            b.iter(|| black_box(BulkPayload::build(entries, &pattern, false).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("gzip", size), &entries, |b, entries| {
            b.iter(|| black_box(BulkPayload::build(entries, &pattern, true).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Batch Benchmarks
// ============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(100));

    group.bench_function("add_100_then_flush", |b| {
        let batch = Batch::new(100, Duration::from_secs(5));
        b.iter(|| {
            for i in 0..100 {
                batch.add(sample_entry(i));
            }
            black_box(batch.flush())
        });
    });

    group.bench_function("contended_add_4_threads", |b| {
        b.iter(|| {
            let batch = Arc::new(Batch::new(10_000, Duration::from_secs(5)));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let batch = Arc::clone(&batch);
                    thread::spawn(move || {
                        for i in 0..25 {
                            batch.add(sample_entry(i));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            black_box(batch.flush())
        });
    });

    group.finish();
}

// ============================================================================
// Metrics Benchmarks
// ============================================================================

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    group.throughput(Throughput::Elements(1));

    let metrics = Metrics::new();
    group.bench_function("record_total", |b| {
        b.iter(|| black_box(metrics.record_total()));
    });
    group.bench_function("record_latency", |b| {
        b.iter(|| metrics.record_latency(black_box(Duration::from_micros(150))));
    });
    group.bench_function("snapshot", |b| {
        b.iter(|| black_box(metrics.snapshot()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_document,
    bench_payload,
    bench_batch,
    bench_metrics
);
criterion_main!(benches);
