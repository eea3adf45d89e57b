// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for memslot.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`:
//! callers match on the variant to decide whether to retry, wait or give up.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for memslot.
#[derive(Debug, Error)]
pub enum MemslotError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Store Errors
    // =========================================================================
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors reject a configuration or an identifier outright.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid region name '{name}': {reason}")]
    InvalidRegionName { name: String, reason: String },

    #[error("Payload capacity out of bounds: {size} bytes (min: {min}, max: {max})")]
    CapacityOutOfBounds { size: usize, min: usize, max: usize },
}

/// Failures of the shared value store.
///
/// `Initialization` is fatal to the session that hit it. Every other variant
/// is an operational failure: the lock has been released and the stored
/// value is unchanged by the failed call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to initialize region '{name}': {reason}")]
    Initialization { name: String, reason: String },

    #[error("Value too large for region: {size} bytes > {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("Invalid magic number - shared memory not initialized")]
    UninitializedRegion,

    #[error("No data in shared memory")]
    EmptyData,

    #[error("Protocol version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Timeout waiting for new data after {waited_ms}ms (last seen sequence {last_seen})")]
    Timeout { waited_ms: u64, last_seen: u64 },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    #[error("Corrupt header: payload length {length} exceeds capacity {capacity}")]
    CorruptHeader { length: u64, capacity: usize },

    #[error("Lock operation '{operation}' failed: {reason}")]
    Lock {
        operation: &'static str,
        reason: String,
    },

    #[error("Wait cancelled before new data arrived")]
    Cancelled,
}

impl StoreError {
    pub(crate) fn init(name: &str, reason: impl Into<String>) -> Self {
        Self::Initialization {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using MemslotError.
pub type MemslotResult<T> = Result<T, MemslotError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::ValueTooLarge {
            size: 2048,
            max: 1024,
        };
        assert!(err.to_string().contains("2048"));
        assert!(err.to_string().contains("1024"));

        let err = StoreError::UninitializedRegion;
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn test_error_chain() {
        let store_err = StoreError::init("cfg", "shm_open failed");
        let err: MemslotError = store_err.into();
        assert!(matches!(err, MemslotError::Store(_)));
        assert!(err.to_string().contains("cfg"));

        let validation_err = HardValidationError::CapacityOutOfBounds {
            size: 0,
            min: 1,
            max: 10,
        };
        let err: MemslotError = validation_err.into();
        assert!(matches!(err, MemslotError::HardValidation(_)));
    }
}
