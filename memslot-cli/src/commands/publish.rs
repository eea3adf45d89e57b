// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot publish` command - Create a region and write a sample document
//! on every publish interval.

use memslot_core::{Config, MemslotResult};

use super::{open_store, run_blocking, CommandResult};
use crate::messages::sample_document;
use crate::shutdown::ShutdownFlag;

pub async fn execute(config: &Config, name: &str) -> CommandResult {
    tracing::info!(name = %name, "Starting publisher");

    let shutdown = ShutdownFlag::install();
    let config = config.clone();
    let name = name.to_string();

    run_blocking(move || publish_loop(&config, &name, &shutdown)).await
}

fn publish_loop(config: &Config, name: &str, shutdown: &ShutdownFlag) -> MemslotResult<()> {
    let store = open_store(config, name, true)?;

    println!(
        "✓ Created region '{}' ({} payload)",
        store.name(),
        config.store.max_payload_size
    );
    println!("Publishing every {:?}. Press Ctrl+C to stop.", config.timing.publish_interval);
    println!();

    let mut counter = 0u64;
    loop {
        match store.write(&sample_document(counter)) {
            Ok(sequence) => println!("✓ Wrote counter={} (seq={})", counter, sequence),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Write failed");
                eprintln!("✗ Write failed: {}", e);
            }
        }
        counter += 1;

        if !shutdown.sleep(config.timing.publish_interval) {
            break;
        }
    }

    println!("Publisher stopped after {} writes", counter);
    Ok(())
}
