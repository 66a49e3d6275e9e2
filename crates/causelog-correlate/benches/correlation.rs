//! Benchmark for correlation passes over full buffers
//! Run: cargo bench -p causelog-correlate --bench correlation

use causelog_core::{LogLevel, LogRecord};
use causelog_correlate::Correlator;
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

fn snapshot(size: usize) -> Vec<LogRecord> {
    let base = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
    let services = ["API-GATEWAY", "DB-SERVICE", "USER-SERVICE", "CACHE-SERVICE"];
    (0..size)
        .map(|i| {
            let message = if i % 7 == 0 {
                format!("Connection timeout on /api/orders/{}", i)
            } else {
                format!("handled request /api/orders/{} in 12ms", i)
            };
            LogRecord {
                id: i as u64,
                service: services[i % services.len()].to_string(),
                timestamp: base + Duration::milliseconds(i as i64 * 10),
                level: if i % 7 == 0 { LogLevel::Error } else { LogLevel::Info },
                message: message.clone(),
                source_identity: "bench".to_string(),
                raw: message,
            }
        })
        .collect()
}

fn bench_correlate(c: &mut Criterion) {
    let correlator = Correlator::default();
    let mut group = c.benchmark_group("correlate");

    for size in [100, 1000] {
        let snap = snapshot(size);
        let trigger = snap[size / 2].clone();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("full_buffer", size), &snap, |b, snap| {
            b.iter(|| correlator.correlate(black_box(&trigger), black_box(snap), 5000))
        });
    }

    group.finish();
}

fn bench_correlate_empty_buffer(c: &mut Criterion) {
    let correlator = Correlator::default();
    let trigger = snapshot(1).pop().unwrap();

    c.bench_function("correlate_empty_buffer", |b| {
        b.iter(|| correlator.correlate(black_box(&trigger), black_box(&[]), 5000))
    });
}

criterion_group!(benches, bench_correlate, bench_correlate_empty_buffer);
criterion_main!(benches);
