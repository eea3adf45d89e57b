// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot control` command - Send commands to services.
//!
//! Creates the commands region. Interactive mode reads menu choices from
//! stdin; demo mode cycles through sample commands.

use std::io::{BufRead, Write};
use std::time::Duration;

use memslot_core::{Config, MemslotError, MemslotResult, ValueStore};
use serde_json::Value;

use super::{open_store, run_blocking, CommandResult};
use crate::messages::{Command, MenuChoice, MENU};
use crate::shutdown::ShutdownFlag;

/// Pause between demo commands.
const DEMO_INTERVAL: Duration = Duration::from_secs(3);

pub async fn execute(config: &Config, demo: bool) -> CommandResult {
    let config = config.clone();

    if demo {
        let shutdown = ShutdownFlag::install();
        run_blocking(move || demo_loop(&config, &shutdown)).await
    } else {
        // Ctrl-C keeps its default behaviour here: stdin reads cannot be
        // interrupted by the flag. A stale region is removed on next create.
        run_blocking(move || interactive_loop(&config)).await
    }
}

fn create_channel(config: &Config) -> MemslotResult<ValueStore> {
    let store = open_store(config, config.channels.commands.as_str(), true)?;
    println!("✓ Command channel '{}' ready", store.name());
    Ok(store)
}

fn send(store: &ValueStore, document: &Value) {
    match store.write(document) {
        Ok(sequence) => println!("→ Sent (seq={}): {}", sequence, document),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to send command");
            eprintln!("✗ Failed to send command: {}", e);
        }
    }
}

fn demo_loop(config: &Config, shutdown: &ShutdownFlag) -> MemslotResult<()> {
    let store = create_channel(config)?;
    println!("Demo mode: one command every {:?}. Press Ctrl+C to stop.", DEMO_INTERVAL);
    println!();

    let mut counter = 0u64;
    while !shutdown.is_set() {
        send(&store, &Command::demo(counter).to_document());
        counter += 1;

        if !shutdown.sleep(DEMO_INTERVAL) {
            break;
        }
    }

    println!("Controller stopped after {} commands", counter);
    Ok(())
}

fn interactive_loop(config: &Config) -> MemslotResult<()> {
    let store = create_channel(config)?;
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        println!("{}", MENU);
        prompt("> ")?;

        let Some(line) = lines.next().transpose().map_err(stdin_error)? else {
            break;
        };

        match MenuChoice::parse(&line) {
            MenuChoice::Send(command) => send(&store, &command.to_document()),
            MenuChoice::Custom => {
                prompt("Enter JSON command: ")?;
                let Some(json) = lines.next().transpose().map_err(stdin_error)? else {
                    break;
                };
                match serde_json::from_str::<Value>(&json) {
                    Ok(document) => send(&store, &document),
                    Err(e) => eprintln!("✗ Invalid JSON: {}", e),
                }
            }
            MenuChoice::Quit => break,
            MenuChoice::Unknown => eprintln!("✗ Unknown choice: {}", line.trim()),
        }
    }

    println!("Controller stopped");
    Ok(())
}

fn prompt(text: &str) -> MemslotResult<()> {
    print!("{}", text);
    std::io::stdout().flush().map_err(|e| MemslotError::Io {
        context: "flushing stdout",
        source: e,
    })
}

fn stdin_error(source: std::io::Error) -> MemslotError {
    MemslotError::Io {
        context: "reading stdin",
        source,
    }
}
