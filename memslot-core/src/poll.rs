// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Timeout-bounded wait for a newer sequence number.
//!
//! There is no cross-process condition variable, so waiting is a loop of
//! short lock holds separated by a fixed sleep:
//!
//! ```text
//! WAITING -> CHECK -> DELIVER
//!              |  \-> TIMEOUT            (elapsed >= timeout)
//!              \----> SLEEP -> CHECK     (elapsed <  timeout)
//! ```
//!
//! The interval is fixed rather than exponential, so a timeout fires at most
//! one interval late.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{StoreError, StoreResult};

/// Default sleep between two checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What the poll loop does after one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// A qualifying write is present; hand over to the reader.
    Deliver,
    /// Nothing new yet and time remains.
    Sleep,
    /// Nothing new and the deadline has passed.
    TimedOut,
}

impl PollStep {
    /// Decide the next step from one check result.
    pub fn after_check(ready: bool, elapsed: Duration, timeout: Duration) -> Self {
        if ready {
            Self::Deliver
        } else if elapsed >= timeout {
            Self::TimedOut
        } else {
            Self::Sleep
        }
    }
}

/// Fixed-interval poller.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `check` until it reports ready, the timeout passes or `stop` is
    /// raised. `check` is expected to take and release the region lock.
    pub fn wait<F>(
        &self,
        timeout: Duration,
        last_seen: u64,
        stop: Option<&AtomicBool>,
        mut check: F,
    ) -> StoreResult<()>
    where
        F: FnMut() -> StoreResult<bool>,
    {
        let start = Instant::now();
        let mut cycles: u64 = 0;

        loop {
            let ready = check()?;
            let elapsed = start.elapsed();

            match PollStep::after_check(ready, elapsed, timeout) {
                PollStep::Deliver => {
                    tracing::trace!(cycles, last_seen, "New data available");
                    return Ok(());
                }
                PollStep::TimedOut => {
                    return Err(StoreError::Timeout {
                        waited_ms: elapsed.as_millis() as u64,
                        last_seen,
                    });
                }
                PollStep::Sleep => {}
            }

            if stop.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                return Err(StoreError::Cancelled);
            }

            cycles += 1;
            std::thread::sleep(self.interval);
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_transitions() {
        let timeout = Duration::from_millis(100);
        assert_eq!(
            PollStep::after_check(true, Duration::from_millis(500), timeout),
            PollStep::Deliver
        );
        assert_eq!(
            PollStep::after_check(false, Duration::from_millis(99), timeout),
            PollStep::Sleep
        );
        assert_eq!(
            PollStep::after_check(false, Duration::from_millis(100), timeout),
            PollStep::TimedOut
        );
    }

    #[test]
    fn test_delivers_after_a_few_cycles() {
        let poller = Poller::new(Duration::from_millis(1));
        let mut calls = 0;
        let result = poller.wait(Duration::from_secs(5), 0, None, || {
            calls += 1;
            Ok(calls == 3)
        });
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_times_out_not_early() {
        let poller = Poller::new(Duration::from_millis(5));
        let start = Instant::now();
        let result = poller.wait(Duration::from_millis(50), 7, None, || Ok(false));
        let elapsed = start.elapsed();

        assert!(matches!(
            result,
            Err(StoreError::Timeout { last_seen: 7, .. })
        ));
        assert!(elapsed >= Duration::from_millis(50));
    }

    #[test]
    fn test_zero_timeout_checks_once() {
        let poller = Poller::default();
        let mut calls = 0;
        let result = poller.wait(Duration::ZERO, 0, None, || {
            calls += 1;
            Ok(false)
        });
        assert!(matches!(result, Err(StoreError::Timeout { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_stop_flag_cancels() {
        let poller = Poller::new(Duration::from_millis(1));
        let stop = AtomicBool::new(true);
        let result = poller.wait(Duration::from_secs(60), 0, Some(&stop), || Ok(false));
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[test]
    fn test_check_error_propagates() {
        let poller = Poller::default();
        let result = poller.wait(Duration::from_secs(1), 0, None, || {
            Err(StoreError::Lock {
                operation: "sem_wait",
                reason: "EINVAL".to_string(),
            })
        });
        assert!(matches!(result, Err(StoreError::Lock { .. })));
    }
}
