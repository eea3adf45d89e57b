// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! ValueStore - one structured value in a named shared memory region.
//!
//! Writers replace the value and bump the sequence number; readers copy the
//! payload out under the lock and deserialize after releasing it. Values are
//! JSON encoded by default, raw byte access is available for callers with
//! their own encoding.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::poll::{Poller, DEFAULT_POLL_INTERVAL};
use crate::shm::header::{check_capacity, current_timestamp_us, RegionHeader, HEADER_SIZE};
use crate::shm::{PlatformRegion, RegionBackend, RegionGuard};
use crate::types::{PayloadCapacity, RegionName};

/// Construction parameters for a [`ValueStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Payload capacity in bytes, excluding the header.
    pub max_data_size: PayloadCapacity,
    /// Sleep between two checks of `read_with_timeout`.
    pub poll_interval: Duration,
    /// Create the region (and own its lifetime) instead of opening it.
    pub create: bool,
}

impl StoreOptions {
    pub fn new(max_data_size: PayloadCapacity, create: bool) -> Self {
        Self {
            max_data_size,
            poll_interval: DEFAULT_POLL_INTERVAL,
            create,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// A value together with the header fields it was read with.
///
/// All three fields come from the same critical section.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub value: T,
    pub sequence: u64,
    pub timestamp_us: u64,
}

impl<T> Snapshot<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Snapshot<U> {
        Snapshot {
            value: f(self.value),
            sequence: self.sequence,
            timestamp_us: self.timestamp_us,
        }
    }
}

/// Handle to a shared value region.
///
/// Dropping the handle unmaps the region; the creator also removes the
/// named shared memory object and its lock. The region lock is only ever
/// taken inside these methods, through a scoped guard.
pub struct ValueStore {
    region: PlatformRegion,
    max_data_size: usize,
    poller: Poller,
    last_error: Mutex<String>,
}

impl ValueStore {
    /// Create a region named `name` holding up to `max_data_size` payload
    /// bytes. Stale objects of the same name are removed first.
    pub fn create(name: &str, max_data_size: usize) -> StoreResult<Self> {
        Self::new(name, max_data_size, true)
    }

    /// Attach to a region created elsewhere with the same `max_data_size`.
    pub fn open(name: &str, max_data_size: usize) -> StoreResult<Self> {
        Self::new(name, max_data_size, false)
    }

    /// Create or open depending on `create`.
    pub fn new(name: &str, max_data_size: usize, create: bool) -> StoreResult<Self> {
        let capacity = PayloadCapacity::new(max_data_size)
            .map_err(|e| StoreError::init(name, e.to_string()))?;
        Self::with_options(name, StoreOptions::new(capacity, create))
    }

    /// Construct with explicit options. Fails fast with
    /// [`StoreError::Initialization`]; nothing is retried.
    pub fn with_options(name: &str, options: StoreOptions) -> StoreResult<Self> {
        let region_name =
            RegionName::new(name).map_err(|e| StoreError::init(name, e.to_string()))?;
        let max_data_size = options.max_data_size.bytes();
        let total_size = HEADER_SIZE + max_data_size;

        let region = if options.create {
            PlatformRegion::create(&region_name, total_size)?
        } else {
            PlatformRegion::open(&region_name, total_size)?
        };

        tracing::info!(
            name = %region_name,
            capacity = max_data_size,
            creator = options.create,
            "Value store ready"
        );

        Ok(Self {
            region,
            max_data_size,
            poller: Poller::new(options.poll_interval),
            last_error: Mutex::new(String::new()),
        })
    }

    /// Serialize `value` as JSON and store it. Returns the new sequence
    /// number. On failure the previous value is left untouched.
    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> StoreResult<u64> {
        let result = serde_json::to_vec(value)
            .map_err(|e| StoreError::Serialization {
                reason: e.to_string(),
            })
            .and_then(|payload| self.commit(&payload));
        self.record(result)
    }

    /// Store raw payload bytes. Returns the new sequence number.
    pub fn write_bytes(&self, payload: &[u8]) -> StoreResult<u64> {
        let result = self.commit(payload);
        self.record(result)
    }

    /// Read and deserialize the current value.
    pub fn read<T: DeserializeOwned>(&self) -> StoreResult<T> {
        self.snapshot().map(|snapshot| snapshot.value)
    }

    /// Read the current value along with its sequence number and timestamp.
    pub fn snapshot<T: DeserializeOwned>(&self) -> StoreResult<Snapshot<T>> {
        let result = self.copy_out().and_then(decode);
        self.record(result)
    }

    /// Copy out the current payload without decoding it.
    pub fn read_bytes(&self) -> StoreResult<Vec<u8>> {
        let result = self.copy_out().map(|snapshot| snapshot.value);
        self.record(result)
    }

    /// Wait up to `timeout` for a value whose sequence number is greater
    /// than `last_seen`, then read it. `last_seen == 0` accepts any value.
    ///
    /// The value returned is never older than `last_seen`, but a write that
    /// lands between the check and the read is returned in its place.
    pub fn read_with_timeout<T: DeserializeOwned>(
        &self,
        timeout: Duration,
        last_seen: u64,
    ) -> StoreResult<T> {
        self.wait_for_update(timeout, last_seen, None)
            .map(|snapshot| snapshot.value)
    }

    /// [`read_with_timeout`](Self::read_with_timeout) returning the snapshot
    /// and checking `stop` between poll cycles.
    pub fn wait_for_update<T: DeserializeOwned>(
        &self,
        timeout: Duration,
        last_seen: u64,
        stop: Option<&AtomicBool>,
    ) -> StoreResult<Snapshot<T>> {
        let result = self
            .poller
            .wait(timeout, last_seen, stop, || {
                let guard = RegionGuard::acquire(&self.region)?;
                Ok(guard.header().has_newer_than(last_seen))
            })
            .and_then(|()| self.copy_out())
            .and_then(decode);
        self.record(result)
    }

    /// Current sequence number, 0 if nothing was ever written. Does not need
    /// a valid payload and does not touch the last error.
    pub fn sequence_number(&self) -> StoreResult<u64> {
        Ok(self.metadata()?.sequence)
    }

    /// Decoded copy of the header, taken under the lock.
    pub fn metadata(&self) -> StoreResult<RegionHeader> {
        let guard = RegionGuard::acquire(&self.region)?;
        Ok(guard.header())
    }

    /// Description of the most recent failed operation on this handle.
    pub fn last_error(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Payload capacity in bytes.
    pub fn max_data_size(&self) -> usize {
        self.max_data_size
    }

    pub fn poll_interval(&self) -> Duration {
        self.poller.interval()
    }

    pub fn name(&self) -> &RegionName {
        self.region.name()
    }

    pub fn is_creator(&self) -> bool {
        self.region.is_creator()
    }

    /// Commit a payload: capacity check first, then one locked header and
    /// payload update.
    fn commit(&self, payload: &[u8]) -> StoreResult<u64> {
        check_capacity(payload.len(), self.max_data_size)?;

        let mut guard = RegionGuard::acquire(&self.region)?;
        let header = guard
            .header()
            .next_write(payload.len(), current_timestamp_us());
        guard.payload_mut(payload.len()).copy_from_slice(payload);
        guard.set_header(&header);

        tracing::debug!(
            name = %self.region.name(),
            sequence = header.sequence,
            bytes = payload.len(),
            "Committed write"
        );

        Ok(header.sequence)
    }

    /// Validate the header and copy the payload out under the lock.
    fn copy_out(&self) -> StoreResult<Snapshot<Vec<u8>>> {
        let guard = RegionGuard::acquire(&self.region)?;
        let header = guard.header();
        let len = header.validate_for_read(self.max_data_size)?;

        Ok(Snapshot {
            value: guard.payload(len).to_vec(),
            sequence: header.sequence,
            timestamp_us: header.timestamp_us,
        })
    }

    fn record<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(e) = &result {
            tracing::debug!(name = %self.region.name(), error = %e, "Store operation failed");
            *self
                .last_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = e.to_string();
        }
        result
    }
}

fn decode<T: DeserializeOwned>(snapshot: Snapshot<Vec<u8>>) -> StoreResult<Snapshot<T>> {
    let value = serde_json::from_slice(&snapshot.value).map_err(|e| StoreError::Serialization {
        reason: e.to_string(),
    })?;
    Ok(snapshot.map(|_| value))
}
