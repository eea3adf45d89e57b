// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! PosixRegion - POSIX shared memory plus named semaphore.
//!
//! The region lives in `shm_open("/<name>")`, the lock is
//! `sem_open("/sem_<name>")` with an initial value of 1. Each OS resource is
//! wrapped in its own owner type so a failure halfway through `create`
//! releases whatever was already acquired.

use std::ffi::CString;
use std::fs::File;
use std::os::fd::AsRawFd;
use std::ptr::NonNull;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;

use crate::error::{StoreError, StoreResult};
use crate::shm::backend::RegionBackend;
use crate::types::RegionName;

/// Permission bits for both the shared memory object and the semaphore.
const OBJECT_MODE: u32 = 0o600;

/// Region backed by `shm_open` + `mmap`, guarded by a named semaphore.
///
/// Field order is drop order: unmap, then close/unlink the memory object,
/// then close/unlink the semaphore.
pub struct PosixRegion {
    name: RegionName,
    mapping: Mapping,
    _memory: MemoryObject,
    semaphore: NamedSemaphore,
    is_owner: bool,
}

impl RegionBackend for PosixRegion {
    fn create(name: &RegionName, total_size: usize) -> StoreResult<Self> {
        // A previous creator that crashed leaves both objects behind.
        // Start from a clean slate so stale state is never inherited.
        NamedSemaphore::remove(name);
        MemoryObject::remove(name);

        let semaphore = NamedSemaphore::create(name)?;
        let memory = MemoryObject::create(name, total_size)?;
        let mapping = Mapping::new(name, &memory.file, total_size)?;

        // SAFETY: the mapping is exactly total_size bytes and nothing else
        // can observe it before this constructor returns the lock unheld.
        unsafe {
            std::ptr::write_bytes(mapping.ptr.as_ptr(), 0, total_size);
        }

        tracing::debug!(name = %name, size = total_size, "Created shared memory region");

        Ok(Self {
            name: name.clone(),
            mapping,
            _memory: memory,
            semaphore,
            is_owner: true,
        })
    }

    fn open(name: &RegionName, total_size: usize) -> StoreResult<Self> {
        let semaphore = NamedSemaphore::open(name)?;
        let memory = MemoryObject::open(name, total_size)?;
        let mapping = Mapping::new(name, &memory.file, total_size)?;

        tracing::debug!(name = %name, size = total_size, "Opened shared memory region");

        Ok(Self {
            name: name.clone(),
            mapping,
            _memory: memory,
            semaphore,
            is_owner: false,
        })
    }

    fn lock(&self) -> StoreResult<()> {
        self.semaphore.wait()
    }

    fn unlock(&self) -> StoreResult<()> {
        self.semaphore.post()
    }

    fn as_ptr(&self) -> *mut u8 {
        self.mapping.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.mapping.size
    }

    fn name(&self) -> &RegionName {
        &self.name
    }

    fn is_creator(&self) -> bool {
        self.is_owner
    }
}

/// The `shm_open` object. Unlinked on drop when owned.
struct MemoryObject {
    file: File,
    shm_name: String,
    is_owner: bool,
}

impl MemoryObject {
    fn create(name: &RegionName, size: usize) -> StoreResult<Self> {
        let shm_name = name.shm_name();
        let fd = shm_open(
            shm_name.as_str(),
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::from_bits_truncate(OBJECT_MODE as _),
        )
        .map_err(|e| StoreError::init(name.as_str(), format!("shm_open failed: {}", e)))?;

        // Owned from here on, so an early return below unlinks it again.
        let object = Self {
            file: File::from(fd),
            shm_name,
            is_owner: true,
        };

        object.file.set_len(size as u64).map_err(|e| {
            StoreError::init(name.as_str(), format!("ftruncate failed: {}", e))
        })?;

        Ok(object)
    }

    fn open(name: &RegionName, expected_size: usize) -> StoreResult<Self> {
        let shm_name = name.shm_name();
        let fd = shm_open(shm_name.as_str(), OFlag::O_RDWR, Mode::empty()).map_err(|e| {
            let reason = if e == Errno::ENOENT {
                "shared memory does not exist".to_string()
            } else {
                format!("shm_open failed: {}", e)
            };
            StoreError::init(name.as_str(), reason)
        })?;

        let file = File::from(fd);
        let actual = file
            .metadata()
            .map_err(|e| StoreError::init(name.as_str(), format!("fstat failed: {}", e)))?
            .len();

        if !size_matches(actual, expected_size as u64) {
            return Err(StoreError::init(
                name.as_str(),
                format!(
                    "size mismatch: region is {} bytes, caller expects {} bytes",
                    actual, expected_size
                ),
            ));
        }

        Ok(Self {
            file,
            shm_name,
            is_owner: false,
        })
    }

    /// Unlink a leftover object. Missing objects are fine.
    fn remove(name: &RegionName) {
        match shm_unlink(name.shm_name().as_str()) {
            Ok(()) => tracing::debug!(name = %name, "Removed stale shared memory object"),
            Err(Errno::ENOENT) => {}
            Err(e) => tracing::warn!(name = %name, error = %e, "Failed to remove stale shared memory"),
        }
    }
}

impl Drop for MemoryObject {
    fn drop(&mut self) {
        if self.is_owner {
            match shm_unlink(self.shm_name.as_str()) {
                Ok(()) => tracing::debug!(shm = %self.shm_name, "Unlinked shared memory region"),
                Err(e) => tracing::warn!(shm = %self.shm_name, error = %e, "Failed to unlink shared memory"),
            }
        }
    }
}

/// Linux reports the exact `ftruncate` size; other kernels round the object
/// up to a whole page.
fn size_matches(actual: u64, expected: u64) -> bool {
    if cfg!(target_os = "linux") {
        return actual == expected;
    }
    // SAFETY: sysconf has no memory-safety preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let page = if page > 0 { page as u64 } else { 4096 };
    actual >= expected && actual - expected < page
}

/// Local `mmap` view. Unmapped on drop, for owners and openers alike.
struct Mapping {
    ptr: NonNull<u8>,
    size: usize,
}

// SAFETY: the mapping is plain shared memory; access is serialized by the
// region lock, not by thread affinity.
unsafe impl Send for Mapping {}
unsafe impl Sync for Mapping {}

impl Mapping {
    fn new(name: &RegionName, file: &File, size: usize) -> StoreResult<Self> {
        // SAFETY: fd is a valid shm descriptor sized to at least `size`.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(StoreError::init(
                name.as_str(),
                format!("mmap failed: {}", Errno::last()),
            ));
        }

        let ptr = NonNull::new(ptr as *mut u8)
            .ok_or_else(|| StoreError::init(name.as_str(), "mmap returned null"))?;

        Ok(Self { ptr, size })
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: ptr and size come from a successful mmap.
        let result = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) };
        if result < 0 {
            tracing::error!(error = %Errno::last(), "Failed to unmap shared memory");
        }
    }
}

/// Named POSIX semaphore used as a binary cross-process lock.
///
/// If a process dies between `wait` and `post` the semaphore stays at zero
/// and every later `wait` blocks forever. Recovering from that is an
/// operator action (remove `/dev/shm/sem.<name>` and recreate the region);
/// nothing here tries to detect it.
struct NamedSemaphore {
    sem: NonNull<libc::sem_t>,
    c_name: CString,
    is_owner: bool,
}

// SAFETY: named semaphores are designed for concurrent use from any thread
// or process.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    fn create(name: &RegionName) -> StoreResult<Self> {
        let c_name = lock_c_name(name)?;
        // SAFETY: c_name is a valid CString; mode and initial value are
        // passed as the variadic arguments sem_open expects with O_CREAT.
        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                OBJECT_MODE as libc::c_uint,
                1 as libc::c_uint,
            )
        };
        Self::from_raw(name, sem, c_name, true)
    }

    fn open(name: &RegionName) -> StoreResult<Self> {
        let c_name = lock_c_name(name)?;
        // SAFETY: c_name is a valid CString.
        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        Self::from_raw(name, sem, c_name, false)
    }

    fn from_raw(
        name: &RegionName,
        sem: *mut libc::sem_t,
        c_name: CString,
        is_owner: bool,
    ) -> StoreResult<Self> {
        if sem == libc::SEM_FAILED {
            let errno = Errno::last();
            let reason = if errno == Errno::ENOENT {
                "lock semaphore does not exist".to_string()
            } else {
                format!("sem_open failed: {}", errno)
            };
            return Err(StoreError::init(name.as_str(), reason));
        }

        let sem = NonNull::new(sem)
            .ok_or_else(|| StoreError::init(name.as_str(), "sem_open returned null"))?;

        Ok(Self {
            sem,
            c_name,
            is_owner,
        })
    }

    fn wait(&self) -> StoreResult<()> {
        loop {
            // SAFETY: sem is a live semaphore from sem_open.
            if unsafe { libc::sem_wait(self.sem.as_ptr()) } == 0 {
                return Ok(());
            }
            match Errno::last() {
                Errno::EINTR => continue,
                errno => {
                    return Err(StoreError::Lock {
                        operation: "sem_wait",
                        reason: errno.to_string(),
                    })
                }
            }
        }
    }

    fn post(&self) -> StoreResult<()> {
        // SAFETY: sem is a live semaphore from sem_open.
        if unsafe { libc::sem_post(self.sem.as_ptr()) } == 0 {
            return Ok(());
        }
        Err(StoreError::Lock {
            operation: "sem_post",
            reason: Errno::last().to_string(),
        })
    }

    /// Unlink a leftover semaphore. Missing semaphores are fine.
    fn remove(name: &RegionName) {
        let Ok(c_name) = lock_c_name(name) else {
            return;
        };
        // SAFETY: c_name is a valid CString.
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } == 0 {
            tracing::debug!(name = %name, "Removed stale lock semaphore");
        }
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        // SAFETY: sem came from sem_open and is closed exactly once.
        unsafe { libc::sem_close(self.sem.as_ptr()) };

        if self.is_owner {
            // SAFETY: c_name is a valid CString.
            if unsafe { libc::sem_unlink(self.c_name.as_ptr()) } == 0 {
                tracing::debug!(lock = ?self.c_name, "Unlinked lock semaphore");
            } else {
                tracing::warn!(lock = ?self.c_name, error = %Errno::last(), "Failed to unlink lock semaphore");
            }
        }
    }
}

fn lock_c_name(name: &RegionName) -> StoreResult<CString> {
    CString::new(name.lock_name())
        .map_err(|e| StoreError::init(name.as_str(), format!("Invalid name: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::header::HEADER_SIZE;

    fn unique(tag: &str) -> RegionName {
        RegionName::new(format!("memslot_posix_{}_{}", tag, std::process::id())).unwrap()
    }

    #[test]
    fn test_create_zero_fills() {
        let name = unique("zero");
        let region = PosixRegion::create(&name, HEADER_SIZE + 128).unwrap();
        assert!(region.is_creator());
        assert_eq!(region.size(), HEADER_SIZE + 128);

        // SAFETY: freshly created, no other handle exists.
        let bytes = unsafe { std::slice::from_raw_parts(region.as_ptr(), region.size()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_open_missing_region_fails() {
        let name = unique("missing");
        let result = PosixRegion::open(&name, HEADER_SIZE + 128);
        assert!(matches!(result, Err(StoreError::Initialization { .. })));
    }

    #[test]
    fn test_open_rejects_size_mismatch() {
        let name = unique("mismatch");
        let _creator = PosixRegion::create(&name, HEADER_SIZE + 4096).unwrap();
        let result = PosixRegion::open(&name, HEADER_SIZE + 8192);
        match result {
            Err(StoreError::Initialization { reason, .. }) => {
                assert!(reason.contains("size mismatch"))
            }
            other => panic!("expected size mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_lock_unlock_cycle() {
        let name = unique("lock");
        let region = PosixRegion::create(&name, HEADER_SIZE + 16).unwrap();
        region.lock().unwrap();
        region.unlock().unwrap();
        region.lock().unwrap();
        region.unlock().unwrap();
    }

    #[test]
    fn test_creator_drop_unlinks() {
        let name = unique("unlink");
        let creator = PosixRegion::create(&name, HEADER_SIZE + 16).unwrap();
        {
            let opener = PosixRegion::open(&name, HEADER_SIZE + 16).unwrap();
            assert!(!opener.is_creator());
        }
        // Opener drop leaves the objects in place.
        assert!(PosixRegion::open(&name, HEADER_SIZE + 16).is_ok());

        drop(creator);
        assert!(PosixRegion::open(&name, HEADER_SIZE + 16).is_err());
    }
}
