// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Update notification latency.
//!
//! A writer thread publishes timestamps; the benchmark thread waits with
//! `wait_for_update` and records how long each value took to arrive. The
//! result is dominated by the poll interval, so two intervals are compared.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use memslot_benchmark::LatencyMetrics;
use memslot_core::{PayloadCapacity, StoreOptions, ValueStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const POLL_INTERVALS_MS: &[u64] = &[1, 10];
const SAMPLES: usize = 200;

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn options(interval_ms: u64, create: bool) -> StoreOptions {
    let capacity = PayloadCapacity::from_kb(4).expect("valid capacity");
    StoreOptions::new(capacity, create).poll_interval(Duration::from_millis(interval_ms))
}

/// Collect `SAMPLES` write-to-read latencies and print their distribution.
fn measure(interval_ms: u64) -> LatencyMetrics {
    let name = format!("bench_latency_{}_{}", interval_ms, std::process::id());
    let writer: ValueStore =
        ValueStore::with_options(&name, options(interval_ms, true)).expect("create failed");
    let reader: ValueStore =
        ValueStore::with_options(&name, options(interval_ms, false)).expect("open failed");

    let stop = Arc::new(AtomicBool::new(false));
    let writer_stop = Arc::clone(&stop);
    let handle = thread::spawn(move || {
        while !writer_stop.load(Ordering::Relaxed) {
            writer.write(&now_ns()).expect("Write failed");
            thread::sleep(Duration::from_millis(3));
        }
    });

    let mut last_seen = 0;
    let mut samples = Vec::with_capacity(SAMPLES);
    while samples.len() < SAMPLES {
        let snapshot = reader
            .wait_for_update::<u64>(Duration::from_secs(1), last_seen, None)
            .expect("Wait failed");
        samples.push(now_ns().saturating_sub(snapshot.value));
        last_seen = snapshot.sequence;
    }

    stop.store(true, Ordering::Relaxed);
    handle.join().expect("writer panicked");

    LatencyMetrics::from_samples(samples)
}

fn bench_update_latency(c: &mut Criterion) {
    for &interval_ms in POLL_INTERVALS_MS {
        let metrics = measure(interval_ms);
        println!("poll interval {}ms: {}", interval_ms, metrics.summary());
    }

    // Time for a single wait that is satisfied on the first check.
    let mut group = c.benchmark_group("update_ready");
    for &interval_ms in POLL_INTERVALS_MS {
        group.bench_with_input(
            BenchmarkId::from_parameter(interval_ms),
            &interval_ms,
            |b, &interval_ms| {
                let name = format!("bench_ready_{}_{}", interval_ms, std::process::id());
                let store: ValueStore = ValueStore::with_options(&name, options(interval_ms, true))
                    .expect("create failed");
                store.write(&1u64).expect("Write failed");

                b.iter(|| {
                    let started = Instant::now();
                    store
                        .wait_for_update::<u64>(Duration::from_secs(1), 0, None)
                        .expect("Wait failed");
                    started.elapsed()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_update_latency);
criterion_main!(benches);
