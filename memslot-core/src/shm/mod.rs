// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared Memory module.
//!
//! Named POSIX shared memory regions, the named semaphore that guards each
//! one, and the fixed header protocol stored at offset 0.
//!
//! Only the header layout is public. The backend and its raw lock calls stay
//! inside the crate, so the lock is released exactly once per acquisition:
//!
//! ```compile_fail
//! use memslot_core::shm::RegionBackend;
//! ```
//!
//! ```compile_fail
//! use memslot_core::shm::{PlatformRegion, RegionGuard};
//! ```

mod backend;
pub mod header;
mod lock;
#[cfg(unix)]
mod posix;

pub use header::{RegionHeader, HEADER_SIZE, MAGIC_NUMBER, PROTOCOL_VERSION};

pub(crate) use backend::{PlatformRegion, RegionBackend};
pub(crate) use lock::RegionGuard;
