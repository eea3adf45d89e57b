// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot service` command - Apply commands and publish status.
//!
//! Opens the commands region created by `memslot control` and creates
//! `<status_prefix><service>` for its own status reports.

use std::time::{Duration, Instant};

use memslot_core::{Config, MemslotResult, StoreError, ValueStore};
use serde_json::Value;

use super::{open_store, run_blocking, CommandResult};
use crate::messages::{Command, ServiceState};
use crate::shutdown::ShutdownFlag;

/// Longest wait for a command before checking the status timer.
const COMMAND_WAIT: Duration = Duration::from_millis(100);

pub async fn execute(config: &Config, service: &str) -> CommandResult {
    tracing::info!(service = %service, "Starting service");

    let shutdown = ShutdownFlag::install();
    let config = config.clone();
    let service = service.to_string();

    run_blocking(move || service_loop(&config, &service, &shutdown)).await
}

fn service_loop(config: &Config, service: &str, shutdown: &ShutdownFlag) -> MemslotResult<()> {
    let commands = open_store(config, config.channels.commands.as_str(), false)?;
    // Commands sent before this service started are not replayed.
    let mut last_command = commands.sequence_number()?;

    let status_region = config.channels.status_region(service)?;
    let status = open_store(config, status_region.as_str(), true)?;

    println!("Service '{}' started", service);
    println!("  Listening for commands on: {}", commands.name());
    println!("  Publishing status to:      {}", status.name());
    println!("Press Ctrl+C to stop.");

    let mut state = ServiceState::new(service);
    let started = Instant::now();
    let mut counter = 0u64;
    let mut last_status: Option<Instant> = None;

    while state.running && !shutdown.is_set() {
        let next =
            commands.wait_for_update::<Value>(COMMAND_WAIT, last_command, Some(shutdown.as_atomic()));
        match next {
            Ok(snapshot) => {
                last_command = snapshot.sequence;
                handle_command(&mut state, &snapshot.value);
            }
            Err(StoreError::Timeout { .. }) | Err(StoreError::Cancelled) => {}
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "Failed to read command");
                last_command = commands.sequence_number().unwrap_or(last_command);
                shutdown.sleep(COMMAND_WAIT);
            }
        }

        let due = last_status.map_or(true, |at| at.elapsed() >= config.timing.status_interval);
        if due {
            publish_status(&status, &state, counter, started.elapsed());
            counter += 1;
            last_status = Some(Instant::now());
        }
    }

    println!("Service '{}' stopped", service);
    Ok(())
}

fn handle_command(state: &mut ServiceState, document: &Value) {
    println!();
    println!("[{}] Received command: {}", state.name, document);

    match Command::from_document(document) {
        Some(command) => println!("→ {}", state.apply(&command)),
        None => {
            tracing::debug!(document = %document, "Ignoring unrecognized command");
            println!("→ Ignored (unrecognized command)");
        }
    }
}

fn publish_status(status: &ValueStore, state: &ServiceState, counter: u64, uptime: Duration) {
    match status.write(&state.report(counter, uptime)) {
        Ok(sequence) => {
            tracing::debug!(service = %state.name, counter, sequence, "Status published");
        }
        Err(e) => {
            tracing::warn!(service = %state.name, error = %e, "Failed to publish status");
        }
    }
}
