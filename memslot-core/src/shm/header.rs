// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Fixed-layout region header.
//!
//! The header is packed field by field into a 64 byte buffer at offset 0 of
//! the region. Native byte order, no struct overlay on mapped memory:
//!
//! ```text
//! offset  width  field
//!      0      4  magic number (0x534D4A53, "SMJS")
//!      4      4  protocol version
//!      8      8  payload length
//!     16      8  sequence number
//!     24      8  timestamp (microseconds since epoch)
//!     32     32  reserved, zero
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{StoreError, StoreResult};

/// Marks a region initialized by this protocol.
pub const MAGIC_NUMBER: u32 = 0x534D_4A53;

/// Protocol version written by this implementation.
pub const PROTOCOL_VERSION: u32 = 1;

/// Total header size in bytes. The payload starts right after it.
pub const HEADER_SIZE: usize = 64;

/// Reserved tail of the header, kept zero.
pub const RESERVED_SIZE: usize = 32;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 4;
const LENGTH_OFFSET: usize = 8;
const SEQUENCE_OFFSET: usize = 16;
const TIMESTAMP_OFFSET: usize = 24;
const RESERVED_OFFSET: usize = 32;

/// Decoded copy of the region header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionHeader {
    pub magic: u32,
    pub version: u32,
    /// Bytes of valid payload following the header.
    pub payload_len: u64,
    /// Write counter, 0 until the first write.
    pub sequence: u64,
    /// Microseconds since the Unix epoch of the last successful write.
    pub timestamp_us: u64,
}

impl RegionHeader {
    /// Decode a header from the first `HEADER_SIZE` bytes of a region.
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            magic: u32::from_ne_bytes(field(bytes, MAGIC_OFFSET)),
            version: u32::from_ne_bytes(field(bytes, VERSION_OFFSET)),
            payload_len: u64::from_ne_bytes(field(bytes, LENGTH_OFFSET)),
            sequence: u64::from_ne_bytes(field(bytes, SEQUENCE_OFFSET)),
            timestamp_us: u64::from_ne_bytes(field(bytes, TIMESTAMP_OFFSET)),
        }
    }

    /// Encode into a header buffer. The reserved tail is always zeroed.
    pub fn encode(&self, bytes: &mut [u8; HEADER_SIZE]) {
        bytes[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(&self.magic.to_ne_bytes());
        bytes[VERSION_OFFSET..VERSION_OFFSET + 4].copy_from_slice(&self.version.to_ne_bytes());
        bytes[LENGTH_OFFSET..LENGTH_OFFSET + 8].copy_from_slice(&self.payload_len.to_ne_bytes());
        bytes[SEQUENCE_OFFSET..SEQUENCE_OFFSET + 8].copy_from_slice(&self.sequence.to_ne_bytes());
        bytes[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]
            .copy_from_slice(&self.timestamp_us.to_ne_bytes());
        bytes[RESERVED_OFFSET..RESERVED_OFFSET + RESERVED_SIZE].fill(0);
    }

    /// Whether the magic number proves a writer of this protocol ran.
    pub fn is_initialized(&self) -> bool {
        self.magic == MAGIC_NUMBER
    }

    /// The header state after committing a write of `payload_len` bytes.
    ///
    /// The sequence number wraps instead of overflowing.
    pub fn next_write(&self, payload_len: usize, timestamp_us: u64) -> Self {
        Self {
            magic: MAGIC_NUMBER,
            version: PROTOCOL_VERSION,
            payload_len: payload_len as u64,
            sequence: self.sequence.wrapping_add(1),
            timestamp_us,
        }
    }

    /// Whether a poller waiting past `last_seen` should deliver now.
    pub fn has_newer_than(&self, last_seen: u64) -> bool {
        self.is_initialized() && self.payload_len > 0 && self.sequence > last_seen
    }

    /// Check the header before copying out the payload.
    ///
    /// Order matters: marker, then version, then length. Returns the number
    /// of payload bytes to copy.
    pub fn validate_for_read(&self, capacity: usize) -> StoreResult<usize> {
        if !self.is_initialized() {
            return Err(StoreError::UninitializedRegion);
        }

        if self.version != PROTOCOL_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found: self.version,
            });
        }

        if self.payload_len == 0 {
            return Err(StoreError::EmptyData);
        }

        if self.payload_len > capacity as u64 {
            return Err(StoreError::CorruptHeader {
                length: self.payload_len,
                capacity,
            });
        }

        Ok(self.payload_len as usize)
    }
}

/// Reject a payload that does not fit before the region is touched.
pub fn check_capacity(payload_len: usize, capacity: usize) -> StoreResult<()> {
    if payload_len > capacity {
        return Err(StoreError::ValueTooLarge {
            size: payload_len,
            max: capacity,
        });
    }
    Ok(())
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn current_timestamp_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn field<const N: usize>(bytes: &[u8; HEADER_SIZE], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(sequence: u64, payload_len: u64) -> RegionHeader {
        RegionHeader {
            magic: MAGIC_NUMBER,
            version: PROTOCOL_VERSION,
            payload_len,
            sequence,
            timestamp_us: 1_700_000_000_000_000,
        }
    }

    #[test]
    fn test_field_offsets() {
        let mut buf = [0xFFu8; HEADER_SIZE];
        written(7, 42).encode(&mut buf);

        assert_eq!(&buf[0..4], &MAGIC_NUMBER.to_ne_bytes());
        assert_eq!(&buf[4..8], &PROTOCOL_VERSION.to_ne_bytes());
        assert_eq!(&buf[8..16], &42u64.to_ne_bytes());
        assert_eq!(&buf[16..24], &7u64.to_ne_bytes());
        assert_eq!(&buf[24..32], &1_700_000_000_000_000u64.to_ne_bytes());
        assert!(buf[32..].iter().all(|&b| b == 0), "reserved must be zeroed");
    }

    #[test]
    fn test_zeroed_region_is_uninitialized() {
        let header = RegionHeader::decode(&[0u8; HEADER_SIZE]);
        assert!(!header.is_initialized());
        assert_eq!(header.sequence, 0);
        assert!(matches!(
            header.validate_for_read(1024),
            Err(StoreError::UninitializedRegion)
        ));
    }

    #[test]
    fn test_validation_order() {
        // Bad version is reported even when the length is also zero.
        let mut header = written(1, 0);
        header.version = 2;
        assert!(matches!(
            header.validate_for_read(1024),
            Err(StoreError::VersionMismatch {
                expected: 1,
                found: 2
            })
        ));

        assert!(matches!(
            written(1, 0).validate_for_read(1024),
            Err(StoreError::EmptyData)
        ));
        assert!(matches!(
            written(1, 2048).validate_for_read(1024),
            Err(StoreError::CorruptHeader { length: 2048, .. })
        ));
        assert_eq!(written(1, 10).validate_for_read(1024).unwrap(), 10);
    }

    #[test]
    fn test_next_write_increments_and_wraps() {
        let header = RegionHeader::default().next_write(5, 99);
        assert!(header.is_initialized());
        assert_eq!(header.sequence, 1);
        assert_eq!(header.payload_len, 5);
        assert_eq!(header.timestamp_us, 99);

        let wrapped = written(u64::MAX, 5).next_write(5, 100);
        assert_eq!(wrapped.sequence, 0);
    }

    #[test]
    fn test_has_newer_than() {
        assert!(written(3, 10).has_newer_than(0));
        assert!(written(3, 10).has_newer_than(2));
        assert!(!written(3, 10).has_newer_than(3));
        assert!(!written(3, 0).has_newer_than(0));
        assert!(!RegionHeader::default().has_newer_than(0));
    }

    #[test]
    fn test_check_capacity() {
        assert!(check_capacity(1024, 1024).is_ok());
        assert!(matches!(
            check_capacity(1025, 1024),
            Err(StoreError::ValueTooLarge {
                size: 1025,
                max: 1024
            })
        ));
    }
}
