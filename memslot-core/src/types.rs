// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Region names and payload capacities are checked once at construction so
//! the backend never hands an unusable name to `shm_open`/`sem_open`.

use std::fmt;

use crate::error::HardValidationError;

/// Longest accepted region name. Leaves room for the `/sem_` prefix inside
/// the 255 byte POSIX name limit.
pub const MAX_REGION_NAME_LEN: usize = 200;

/// Smallest accepted payload capacity: 1 byte.
pub const MIN_PAYLOAD_CAPACITY: usize = 1;
/// Largest accepted payload capacity: 256 MB.
pub const MAX_PAYLOAD_CAPACITY: usize = 256 * 1024 * 1024;

/// Validated logical region name.
///
/// The shared memory object is `/<name>` and its lock is `/sem_<name>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionName(String);

impl RegionName {
    /// Create a new RegionName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidRegionName {
                name,
                reason: "Name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_REGION_NAME_LEN {
            let reason = format!(
                "Name too long: {} bytes (max {})",
                name.len(),
                MAX_REGION_NAME_LEN
            );
            return Err(HardValidationError::InvalidRegionName { name, reason });
        }

        if name.contains('/') || name.contains('\0') {
            return Err(HardValidationError::InvalidRegionName {
                name,
                reason: "Name must not contain '/' or NUL".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// POSIX name of the shared memory object.
    pub fn shm_name(&self) -> String {
        format!("/{}", self.0)
    }

    /// POSIX name of the named semaphore guarding the region.
    pub fn lock_name(&self) -> String {
        format!("/sem_{}", self.0)
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegionName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionName> for String {
    fn from(name: RegionName) -> Self {
        name.0
    }
}

/// Validated payload capacity in bytes (the region holds this plus the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadCapacity(usize);

impl PayloadCapacity {
    /// Create a new PayloadCapacity with bounds validation.
    pub fn new(bytes: usize) -> Result<Self, HardValidationError> {
        if !(MIN_PAYLOAD_CAPACITY..=MAX_PAYLOAD_CAPACITY).contains(&bytes) {
            return Err(HardValidationError::CapacityOutOfBounds {
                size: bytes,
                min: MIN_PAYLOAD_CAPACITY,
                max: MAX_PAYLOAD_CAPACITY,
            });
        }
        Ok(Self(bytes))
    }

    /// Create from kilobytes for convenience.
    pub fn from_kb(kb: usize) -> Result<Self, HardValidationError> {
        let bytes = kb
            .checked_mul(1024)
            .ok_or(HardValidationError::CapacityOutOfBounds {
                size: kb,
                min: MIN_PAYLOAD_CAPACITY,
                max: MAX_PAYLOAD_CAPACITY,
            })?;
        Self::new(bytes)
    }

    /// Get the capacity in bytes.
    pub fn bytes(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PayloadCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1024 * 1024 && self.0 % (1024 * 1024) == 0 {
            write!(f, "{}MB", self.0 / (1024 * 1024))
        } else if self.0 >= 1024 && self.0 % 1024 == 0 {
            write!(f, "{}KB", self.0 / 1024)
        } else {
            write!(f, "{}B", self.0)
        }
    }
}

impl TryFrom<usize> for PayloadCapacity {
    type Error = HardValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PayloadCapacity> for usize {
    fn from(capacity: PayloadCapacity) -> Self {
        capacity.0
    }
}
