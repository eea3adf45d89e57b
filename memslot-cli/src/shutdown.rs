// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Ctrl-C handling for the blocking command loops.
//!
//! The store has no cancellation of its own; loops check this flag between
//! poll cycles and between publish intervals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest stretch a loop sleeps without looking at the flag.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared stop flag raised on Ctrl-C or by a command.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create a flag that is raised when the process receives Ctrl-C.
    pub fn install() -> Self {
        let flag = Self::default();
        let signal = flag.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                signal.trigger();
            }
        });
        flag
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// The raw flag, for `ValueStore::wait_for_update`.
    pub fn as_atomic(&self) -> &AtomicBool {
        &self.0
    }

    /// Sleep for `duration` unless the flag goes up first.
    /// Returns false when the sleep was cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_set() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_runs_to_completion() {
        let flag = ShutdownFlag::default();
        let start = Instant::now();
        assert!(flag.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_sleep_cut_short() {
        let flag = ShutdownFlag::default();
        let remote = flag.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.trigger();
        });

        let start = Instant::now();
        assert!(!flag.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }
}
