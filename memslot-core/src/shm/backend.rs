// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Platform capability interface for a named region and its lock.

use crate::error::StoreResult;
use crate::types::RegionName;

/// A named block of shared memory paired with a named exclusive lock.
///
/// One implementation exists per platform family and is selected at build
/// time through [`PlatformRegion`]. Dropping a backend always unmaps the
/// local view; the named OS objects are removed only when
/// [`is_creator`](RegionBackend::is_creator) is true.
pub trait RegionBackend: Send + Sync + Sized {
    /// Allocate the region and its lock, replacing stale objects of the same
    /// name, and zero-fill the mapping.
    fn create(name: &RegionName, total_size: usize) -> StoreResult<Self>;

    /// Attach to an existing region and lock. Never creates or resizes.
    fn open(name: &RegionName, total_size: usize) -> StoreResult<Self>;

    /// Block until the lock is held by the caller. No timeout.
    fn lock(&self) -> StoreResult<()>;

    /// Release a lock previously taken with [`lock`](RegionBackend::lock).
    fn unlock(&self) -> StoreResult<()>;

    /// Base address of the local mapping.
    fn as_ptr(&self) -> *mut u8;

    /// Mapped size in bytes (header plus payload capacity).
    fn size(&self) -> usize;

    /// Logical name the region was created or opened with.
    fn name(&self) -> &RegionName;

    /// Whether this handle owns the OS-level lifetime of the region.
    fn is_creator(&self) -> bool;
}

#[cfg(unix)]
pub type PlatformRegion = super::posix::PosixRegion;

#[cfg(not(unix))]
compile_error!("memslot currently ships a region backend for unix targets only");
