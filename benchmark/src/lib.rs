// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark support for memslot.
//!
//! - **Store throughput**: `write`, `read` and a write+read round trip at
//!   several JSON payload sizes
//! - **Update latency**: time from a write in one thread until a waiting
//!   reader in another thread returns the new value

pub mod metrics;

pub use metrics::{json_payload, LatencyMetrics};
