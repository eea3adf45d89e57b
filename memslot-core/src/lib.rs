//! memslot Core Library
//!
//! Host-local exchange of a single structured value through a named shared
//! memory region: region backend, header protocol, scoped locking, the
//! value store API and the change poller.

pub mod config;
pub mod error;
pub mod poll;
pub mod shm;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigLoader};
pub use error::{HardValidationError, MemslotError, MemslotResult, StoreError, StoreResult};
pub use shm::RegionHeader;
pub use store::{Snapshot, StoreOptions, ValueStore};
pub use types::{PayloadCapacity, RegionName};
