// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot validate` command - Validate configuration file.

use memslot_core::ConfigLoader;

use super::CommandResult;

pub async fn execute(file: &str) -> CommandResult {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Store Settings:");
            println!("  Max Payload Size:   {}", config.store.max_payload_size);
            println!("  Poll Interval:      {:?}", config.store.poll_interval);
            println!();
            println!("Channels:");
            println!("  Commands Region:    {}", config.channels.commands);
            println!(
                "  Status Regions:     {}<service>",
                config.channels.status_prefix
            );
            println!();
            println!("Timing:");
            println!("  Publish Interval:   {:?}", config.timing.publish_interval);
            println!("  Status Interval:    {:?}", config.timing.status_interval);
            println!("  Watch Timeout:      {:?}", config.timing.watch_timeout);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
