// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod control;
pub mod monitor;
pub mod publish;
pub mod read;
pub mod service;
pub mod validate;
pub mod watch;

use memslot_core::{Config, MemslotResult, StoreResult, ValueStore};

/// Result type shared by every command handler.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Create or open `name` with the configured capacity and poll interval.
pub(crate) fn open_store(config: &Config, name: &str, create: bool) -> StoreResult<ValueStore> {
    ValueStore::with_options(name, config.store.options(create))
}

/// Run a polling loop on the blocking pool.
///
/// The store sleeps between poll cycles, so loops never run on the async
/// workers.
pub(crate) async fn run_blocking<F>(task: F) -> CommandResult
where
    F: FnOnce() -> MemslotResult<()> + Send + 'static,
{
    tokio::task::spawn_blocking(task).await??;
    Ok(())
}
