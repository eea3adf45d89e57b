// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot watch` command - Print every new value as it is written.
//!
//! Each cycle waits up to the configured watch timeout. A timeout is
//! reported and the loop keeps going; only Ctrl-C or `--count` end it.

use memslot_core::{Config, MemslotResult, StoreError};
use serde_json::Value;

use super::{open_store, run_blocking, CommandResult};
use crate::shutdown::ShutdownFlag;

pub async fn execute(
    config: &Config,
    name: &str,
    last_seen: u64,
    count: Option<u64>,
) -> CommandResult {
    tracing::info!(name = %name, last_seen, "Watching region");

    let shutdown = ShutdownFlag::install();
    let config = config.clone();
    let name = name.to_string();

    run_blocking(move || watch_loop(&config, &name, last_seen, count, &shutdown)).await
}

fn watch_loop(
    config: &Config,
    name: &str,
    mut last_seen: u64,
    count: Option<u64>,
    shutdown: &ShutdownFlag,
) -> MemslotResult<()> {
    let store = open_store(config, name, false)?;
    let mut received = 0u64;

    while count.map_or(true, |limit| received < limit) {
        let result = store.wait_for_update::<Value>(
            config.timing.watch_timeout,
            last_seen,
            Some(shutdown.as_atomic()),
        );

        match result {
            Ok(snapshot) => {
                last_seen = snapshot.sequence;
                received += 1;
                println!("✓ Received update (seq={})", snapshot.sequence);
                println!("{}", snapshot.value);
            }
            Err(StoreError::Timeout { waited_ms, .. }) => {
                eprintln!("… No new data within {}ms (last seq={})", waited_ms, last_seen);
            }
            Err(StoreError::Cancelled) => break,
            Err(StoreError::Serialization { reason }) => {
                // Skip the undecodable value instead of re-reading it forever.
                eprintln!("✗ Value is not valid JSON: {}", reason);
                last_seen = store.sequence_number()?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::debug!(received, "Watch finished");
    Ok(())
}
