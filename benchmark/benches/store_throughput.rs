// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Store throughput benchmarks.
//!
//! Measures `write`, `read` and a write+read round trip for JSON documents
//! of increasing size, plus raw byte writes for comparison.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memslot_benchmark::json_payload;
use memslot_core::ValueStore;
use serde_json::Value;
use std::time::Duration;

/// Approximate encoded payload sizes.
const PAYLOAD_SIZES: &[usize] = &[64, 1024, 16 * 1024, 256 * 1024];

const CAPACITY: usize = 1024 * 1024;

fn region(tag: &str, size: usize) -> String {
    format!("bench_{}_{}_{}", tag, size, std::process::id())
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_write");
    group.measurement_time(Duration::from_secs(5));

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let store = ValueStore::create(&region("write", size), CAPACITY)
                .expect("Failed to create region");
            let doc = json_payload(size);

            b.iter(|| {
                store.write(black_box(&doc)).expect("Write failed");
            });
        });
    }

    group.finish();
}

fn bench_write_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_write_bytes");

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let store = ValueStore::create(&region("raw", size), CAPACITY)
                .expect("Failed to create region");
            let payload = vec![0xABu8; size];

            b.iter(|| {
                store.write_bytes(black_box(&payload)).expect("Write failed");
            });
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_read");
    group.measurement_time(Duration::from_secs(5));

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let name = region("read", size);
            let writer = ValueStore::create(&name, CAPACITY).expect("Failed to create region");
            let reader = ValueStore::open(&name, CAPACITY).expect("Failed to open region");
            writer.write(&json_payload(size)).expect("Write failed");

            b.iter(|| {
                let value: Value = reader.read().expect("Read failed");
                black_box(value);
            });
        });
    }

    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_round_trip");

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let name = region("rt", size);
            let writer = ValueStore::create(&name, CAPACITY).expect("Failed to create region");
            let reader = ValueStore::open(&name, CAPACITY).expect("Failed to open region");
            let doc = json_payload(size);

            b.iter(|| {
                writer.write(black_box(&doc)).expect("Write failed");
                let value: Value = reader.read().expect("Read failed");
                black_box(value);
            });
        });
    }

    group.finish();
}

fn bench_sequence_number(c: &mut Criterion) {
    let store =
        ValueStore::create(&region("seq", 0), CAPACITY).expect("Failed to create region");
    store.write(&json_payload(64)).expect("Write failed");

    c.bench_function("store_sequence_number", |b| {
        b.iter(|| black_box(store.sequence_number().expect("Header read failed")));
    });
}

criterion_group!(
    benches,
    bench_write,
    bench_write_bytes,
    bench_read,
    bench_round_trip,
    bench_sequence_number
);
criterion_main!(benches);
