// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Every key has a default, so an empty document is a valid configuration.
//! Any out-of-range value results in a HardValidationError.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HardValidationError, MemslotError, MemslotResult};
use crate::poll::DEFAULT_POLL_INTERVAL;
use crate::store::StoreOptions;
use crate::types::{PayloadCapacity, RegionName};

/// Raw store settings as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStoreConfig {
    #[serde(default = "default_max_payload_size")]
    max_payload_size: usize,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
}

fn default_max_payload_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for RawStoreConfig {
    fn default() -> Self {
        Self {
            max_payload_size: default_max_payload_size(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Raw channel naming.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChannelConfig {
    #[serde(default = "default_commands_channel")]
    commands: String,
    #[serde(default = "default_status_prefix")]
    status_prefix: String,
}

fn default_commands_channel() -> String {
    "commands".to_string()
}

fn default_status_prefix() -> String {
    "status_".to_string()
}

impl Default for RawChannelConfig {
    fn default() -> Self {
        Self {
            commands: default_commands_channel(),
            status_prefix: default_status_prefix(),
        }
    }
}

/// Raw loop timings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTimingConfig {
    #[serde(default = "default_publish_interval_ms")]
    publish_interval_ms: u64,
    #[serde(default = "default_status_interval_ms")]
    status_interval_ms: u64,
    #[serde(default = "default_watch_timeout_ms")]
    watch_timeout_ms: u64,
}

fn default_publish_interval_ms() -> u64 {
    2000
}

fn default_status_interval_ms() -> u64 {
    1000
}

fn default_watch_timeout_ms() -> u64 {
    5000
}

impl Default for RawTimingConfig {
    fn default() -> Self {
        Self {
            publish_interval_ms: default_publish_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
            watch_timeout_ms: default_watch_timeout_ms(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    store: RawStoreConfig,
    #[serde(default)]
    channels: RawChannelConfig,
    #[serde(default)]
    timing: RawTimingConfig,
}

/// Validated store settings.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub max_payload_size: PayloadCapacity,
    pub poll_interval: Duration,
}

impl StoreConfig {
    /// Options for constructing a store with these settings.
    pub fn options(&self, create: bool) -> StoreOptions {
        StoreOptions::new(self.max_payload_size, create).poll_interval(self.poll_interval)
    }
}

/// Validated channel naming.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub commands: RegionName,
    pub status_prefix: String,
}

impl ChannelConfig {
    /// Region a service publishes its status to.
    pub fn status_region(&self, service: &str) -> Result<RegionName, HardValidationError> {
        RegionName::new(format!("{}{}", self.status_prefix, service))
    }
}

/// Validated loop timings.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    pub publish_interval: Duration,
    pub status_interval: Duration,
    pub watch_timeout: Duration,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub channels: ChannelConfig,
    pub timing: TimingConfig,
}

impl Default for Config {
    fn default() -> Self {
        // The raw defaults are within every bound checked below.
        ConfigLoader::validate(RawConfig::default())
            .unwrap_or_else(|e| unreachable!("built-in defaults rejected: {}", e))
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> MemslotResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MemslotError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MemslotError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> MemslotResult<Config> {
        // serde_yaml rejects an empty document as a missing mapping.
        if content.trim().is_empty() {
            return Ok(Self::validate(RawConfig::default())?);
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| MemslotError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Ok(Self::validate(raw)?)
    }

    fn validate(raw: RawConfig) -> Result<Config, HardValidationError> {
        Ok(Config {
            store: Self::validate_store(raw.store)?,
            channels: Self::validate_channels(raw.channels)?,
            timing: Self::validate_timing(raw.timing)?,
        })
    }

    fn validate_store(raw: RawStoreConfig) -> Result<StoreConfig, HardValidationError> {
        let max_payload_size = PayloadCapacity::new(raw.max_payload_size)?;

        // Longer intervals make every timeout that much later.
        if raw.poll_interval_ms == 0 || raw.poll_interval_ms > 1000 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "poll_interval_ms",
                value: raw.poll_interval_ms.to_string(),
                reason: "Must be between 1 and 1000".to_string(),
            });
        }

        Ok(StoreConfig {
            max_payload_size,
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
        })
    }

    fn validate_channels(raw: RawChannelConfig) -> Result<ChannelConfig, HardValidationError> {
        let commands = RegionName::new(raw.commands)?;

        // The prefix alone must already be a usable name fragment.
        if raw.status_prefix.contains('/') || raw.status_prefix.contains('\0') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "status_prefix",
                value: raw.status_prefix,
                reason: "Prefix must not contain '/' or NUL".to_string(),
            });
        }

        Ok(ChannelConfig {
            commands,
            status_prefix: raw.status_prefix,
        })
    }

    fn validate_timing(raw: RawTimingConfig) -> Result<TimingConfig, HardValidationError> {
        let checks = [
            ("publish_interval_ms", raw.publish_interval_ms),
            ("status_interval_ms", raw.status_interval_ms),
            ("watch_timeout_ms", raw.watch_timeout_ms),
        ];

        for (field, value) in checks {
            if value == 0 || value > 3_600_000 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: value.to_string(),
                    reason: "Must be between 1ms and 1 hour".to_string(),
                });
            }
        }

        Ok(TimingConfig {
            publish_interval: Duration::from_millis(raw.publish_interval_ms),
            status_interval: Duration::from_millis(raw.status_interval_ms),
            watch_timeout: Duration::from_millis(raw.watch_timeout_ms),
        })
    }
}
