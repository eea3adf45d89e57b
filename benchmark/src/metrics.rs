// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Latency statistics and payload generation for the store benchmarks.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Latency metrics with percentile distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Number of samples
    pub count: usize,
    /// Minimum observed latency in nanoseconds
    pub min_ns: u64,
    /// Maximum observed latency in nanoseconds
    pub max_ns: u64,
    /// Arithmetic mean latency in nanoseconds
    pub mean_ns: f64,
    /// Median (p50) latency in nanoseconds
    pub median_ns: u64,
    /// 95th percentile latency in nanoseconds
    pub p95_ns: u64,
    /// 99th percentile latency in nanoseconds
    pub p99_ns: u64,
}

impl LatencyMetrics {
    /// Calculate metrics from latency samples in nanoseconds.
    pub fn from_samples(mut samples: Vec<u64>) -> Self {
        if samples.is_empty() {
            return Self {
                count: 0,
                min_ns: 0,
                max_ns: 0,
                mean_ns: 0.0,
                median_ns: 0,
                p95_ns: 0,
                p99_ns: 0,
            };
        }

        samples.sort_unstable();
        let len = samples.len();
        let sum: u64 = samples.iter().sum();
        let percentile = |p: f64| samples[((len as f64 * p) as usize).min(len - 1)];

        Self {
            count: len,
            min_ns: samples[0],
            max_ns: samples[len - 1],
            mean_ns: sum as f64 / len as f64,
            median_ns: samples[len / 2],
            p95_ns: percentile(0.95),
            p99_ns: percentile(0.99),
        }
    }

    /// Format latency in human-readable form (auto-selects ns/μs/ms).
    pub fn format_latency(ns: u64) -> String {
        if ns < 1_000 {
            format!("{}ns", ns)
        } else if ns < 1_000_000 {
            format!("{:.2}μs", ns as f64 / 1_000.0)
        } else if ns < 1_000_000_000 {
            format!("{:.2}ms", ns as f64 / 1_000_000.0)
        } else {
            format!("{:.2}s", ns as f64 / 1_000_000_000.0)
        }
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!(
            "n={} min={} p50={} p95={} p99={} max={}",
            self.count,
            Self::format_latency(self.min_ns),
            Self::format_latency(self.median_ns),
            Self::format_latency(self.p95_ns),
            Self::format_latency(self.p99_ns),
            Self::format_latency(self.max_ns),
        )
    }
}

/// A JSON document whose compact encoding is at least `target_bytes` long.
pub fn json_payload(target_bytes: usize) -> Value {
    let mut readings = Vec::new();
    let mut doc = json!({ "sensor": "bench", "readings": [] });
    let mut n = 0u64;

    while doc.to_string().len() < target_bytes {
        readings.push(json!({ "seq": n, "value": 20.0 + (n % 10) as f64 }));
        doc["readings"] = Value::Array(readings.clone());
        n += 1;
    }
    doc
}
