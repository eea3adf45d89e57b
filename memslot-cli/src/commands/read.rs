// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot read` command - Print the current value once.

use memslot_core::Config;
use serde_json::Value;

use super::{open_store, CommandResult};

pub async fn execute(config: &Config, name: &str, raw: bool) -> CommandResult {
    let store = open_store(config, name, false)?;
    let snapshot = store.snapshot::<Value>()?;

    if raw {
        println!("{}", serde_json::to_string(&snapshot.value)?);
    } else {
        println!("✓ Read data (seq={})", snapshot.sequence);
        println!("{}", serde_json::to_string_pretty(&snapshot.value)?);
    }

    Ok(())
}
