// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! memslot CLI
//!
//! Command-line tools built on the shared value store: a periodic publisher,
//! one-shot and streaming readers, a command controller, a status-publishing
//! service and a multi-service monitor.

use clap::{Parser, Subcommand};

use memslot_core::{Config, ConfigLoader};

mod commands;
mod messages;
mod shutdown;
mod tui;

/// memslot - shared memory value exchange between local processes
#[derive(Parser)]
#[command(name = "memslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a region and publish a sample document periodically
    Publish {
        /// Region name
        name: String,
    },

    /// Read the current value once
    Read {
        /// Region name
        name: String,

        /// Print only the compact JSON value
        #[arg(long)]
        raw: bool,
    },

    /// Print every new value as it is written
    Watch {
        /// Region name
        name: String,

        /// Sequence number already seen (0 accepts the current value)
        #[arg(long, default_value_t = 0)]
        last_seen: u64,

        /// Exit after this many values
        #[arg(long)]
        count: Option<u64>,
    },

    /// Create the commands region and send commands to services
    Control {
        /// Cycle through sample commands instead of reading stdin
        #[arg(long)]
        demo: bool,
    },

    /// Apply commands and publish status for one service
    Service {
        /// Service name (status goes to <status_prefix><service>)
        service: String,
    },

    /// Watch the status regions of one or more services
    Monitor {
        /// Service names
        #[arg(required = true)]
        services: Vec<String>,

        /// Print the current status once and exit
        #[arg(short, long, conflicts_with = "dashboard")]
        snapshot: bool,

        /// Show a TUI dashboard instead of streaming text
        #[arg(short, long)]
        dashboard: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for values.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_file(path)?,
        None => Config::default(),
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Publish { name } => commands::publish::execute(&config, &name).await,
        Commands::Read { name, raw } => commands::read::execute(&config, &name, raw).await,
        Commands::Watch {
            name,
            last_seen,
            count,
        } => commands::watch::execute(&config, &name, last_seen, count).await,
        Commands::Control { demo } => commands::control::execute(&config, demo).await,
        Commands::Service { service } => commands::service::execute(&config, &service).await,
        Commands::Monitor {
            services,
            snapshot,
            dashboard,
        } => commands::monitor::execute(&config, services, snapshot, dashboard).await,
        Commands::Validate { file } => commands::validate::execute(&file).await,
    }
}
