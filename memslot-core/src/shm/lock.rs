// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scoped acquisition of the region lock.
//!
//! Mapped memory is only reachable through a [`RegionGuard`], and the guard
//! releases the lock when it goes out of scope, on `?` returns included.

use crate::error::StoreResult;
use crate::shm::backend::RegionBackend;
use crate::shm::header::{RegionHeader, HEADER_SIZE};

/// Holds the region lock for as long as it lives.
pub struct RegionGuard<'a, R: RegionBackend> {
    region: &'a R,
}

impl<'a, R: RegionBackend> RegionGuard<'a, R> {
    /// Block until the region lock is held.
    pub fn acquire(region: &'a R) -> StoreResult<Self> {
        region.lock()?;
        Ok(Self { region })
    }

    /// Decode the header currently stored in the region.
    pub fn header(&self) -> RegionHeader {
        let mut buf = [0u8; HEADER_SIZE];
        buf.copy_from_slice(&self.bytes()[..HEADER_SIZE]);
        RegionHeader::decode(&buf)
    }

    /// Overwrite the header.
    pub fn set_header(&mut self, header: &RegionHeader) {
        let mut buf = [0u8; HEADER_SIZE];
        header.encode(&mut buf);
        self.bytes_mut()[..HEADER_SIZE].copy_from_slice(&buf);
    }

    /// The first `len` payload bytes. `len` must not exceed the capacity.
    pub fn payload(&self, len: usize) -> &[u8] {
        &self.bytes()[HEADER_SIZE..HEADER_SIZE + len]
    }

    /// Mutable view of the first `len` payload bytes.
    pub fn payload_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.bytes_mut()[HEADER_SIZE..HEADER_SIZE + len]
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: the mapping is valid for `size` bytes for the lifetime of
        // `region`, and holding the lock excludes every other accessor.
        unsafe { std::slice::from_raw_parts(self.region.as_ptr(), self.region.size()) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `bytes`; `&mut self` keeps this view unique in-process.
        unsafe { std::slice::from_raw_parts_mut(self.region.as_ptr(), self.region.size()) }
    }
}

impl<R: RegionBackend> Drop for RegionGuard<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.region.unlock() {
            tracing::error!(
                name = %self.region.name(),
                error = %e,
                "Failed to release region lock"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::shm::PlatformRegion;
    use crate::types::RegionName;

    fn region(tag: &str) -> PlatformRegion {
        let name =
            RegionName::new(format!("memslot_lock_{}_{}", tag, std::process::id())).unwrap();
        PlatformRegion::create(&name, HEADER_SIZE + 64).unwrap()
    }

    fn failing_step(region: &PlatformRegion) -> StoreResult<()> {
        let _guard = RegionGuard::acquire(region)?;
        Err(StoreError::EmptyData)
    }

    #[test]
    fn test_guard_releases_on_error_path() {
        let region = region("error_path");
        assert!(failing_step(&region).is_err());
        // Would block forever if the guard had leaked the lock.
        let _guard = RegionGuard::acquire(&region).unwrap();
    }

    #[test]
    fn test_header_roundtrip_through_guard() {
        let region = region("header");
        let mut guard = RegionGuard::acquire(&region).unwrap();
        assert!(!guard.header().is_initialized());

        let header = guard.header().next_write(3, 42);
        guard.set_header(&header);
        guard.payload_mut(3).copy_from_slice(b"abc");

        assert_eq!(guard.header(), header);
        assert_eq!(guard.payload(3), b"abc");
    }

    #[test]
    fn test_guards_are_mutually_exclusive() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use std::thread;
        use std::time::Duration;

        let region = region("exclusive");
        let inside = AtomicBool::new(false);
        let overlaps = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let _guard = RegionGuard::acquire(&region).unwrap();
                        if inside.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_micros(200));
                        inside.store(false, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        // Every acquisition was released exactly once: the lock is free
        // again and still exclusive.
        let _guard = RegionGuard::acquire(&region).unwrap();
    }
}
