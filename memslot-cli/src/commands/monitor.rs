// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `memslot monitor` command - Watch service status regions.

use std::time::Duration;

use memslot_core::{Config, MemslotError, MemslotResult, StoreError, ValueStore};
use serde_json::Value;

use super::{open_store, run_blocking, CommandResult};
use crate::shutdown::ShutdownFlag;
use crate::tui;

/// Wait per service per round in streaming mode.
const SERVICE_WAIT: Duration = Duration::from_millis(100);

/// Status region of one monitored service.
pub(crate) struct Watched {
    pub service: String,
    pub store: ValueStore,
    pub last_seen: u64,
}

pub async fn execute(
    config: &Config,
    services: Vec<String>,
    snapshot: bool,
    dashboard: bool,
) -> CommandResult {
    if dashboard {
        return tui::run_dashboard(config, &services).await;
    }

    let config = config.clone();
    if snapshot {
        run_blocking(move || {
            print_snapshot(&attach_all(&config, &services));
            Ok(())
        })
        .await
    } else {
        let shutdown = ShutdownFlag::install();
        run_blocking(move || stream(&config, &services, &shutdown)).await
    }
}

/// Open the status region of each service. Services whose region cannot be
/// opened are reported and skipped.
pub(crate) fn attach_all(config: &Config, services: &[String]) -> Vec<Watched> {
    services
        .iter()
        .filter_map(|service| match attach(config, service) {
            Ok(store) => {
                println!("✓ Monitoring service: {}", service);
                Some(Watched {
                    service: service.clone(),
                    store,
                    last_seen: 0,
                })
            }
            Err(e) => {
                eprintln!("✗ Failed to add service {}: {}", service, e);
                None
            }
        })
        .collect()
}

fn attach(config: &Config, service: &str) -> MemslotResult<ValueStore> {
    let region = config.channels.status_region(service)?;
    Ok(open_store(config, region.as_str(), false)?)
}

fn print_snapshot(watched: &[Watched]) {
    println!();
    println!("=== Current Status Snapshot ===");
    for entry in watched {
        match entry.store.read::<Value>() {
            Ok(status) => println!("{}", render_status(&entry.service, &status)),
            Err(e) => println!("[{}] No data available ({})", entry.service, e),
        }
    }
}

fn stream(config: &Config, services: &[String], shutdown: &ShutdownFlag) -> MemslotResult<()> {
    let mut watched = attach_all(config, services);
    if watched.is_empty() {
        return Err(MemslotError::Store(StoreError::Initialization {
            name: services.join(","),
            reason: "no status region could be opened".to_string(),
        }));
    }

    println!();
    println!("=== Service Monitor ===");
    println!("Press Ctrl+C to stop.");

    'outer: while !shutdown.is_set() {
        for entry in watched.iter_mut() {
            match entry.store.wait_for_update::<Value>(
                SERVICE_WAIT,
                entry.last_seen,
                Some(shutdown.as_atomic()),
            ) {
                Ok(snapshot) => {
                    entry.last_seen = snapshot.sequence;
                    println!("{}", render_status(&entry.service, &snapshot.value));
                }
                Err(StoreError::Timeout { .. }) => {}
                Err(StoreError::Cancelled) => break 'outer,
                Err(e) => {
                    tracing::warn!(service = %entry.service, error = %e, "Status read failed");
                    entry.last_seen = entry.store.sequence_number().unwrap_or(entry.last_seen);
                }
            }
        }
    }

    Ok(())
}

/// Boxed text rendering of a status document. Missing fields are skipped.
pub(crate) fn render_status(service: &str, status: &Value) -> String {
    let width = 78usize;
    let mut lines = vec![format!(
        "┌─ {} {}┐",
        service,
        "─".repeat(width.saturating_sub(service.chars().count() + 2))
    )];

    if let Some(counter) = status.get("counter") {
        lines.push(format!("│ Update #{}", counter));
    }
    if let Some(active) = status.get("active").and_then(Value::as_bool) {
        lines.push(format!(
            "│ Status: {}",
            if active { "● ACTIVE" } else { "○ INACTIVE" }
        ));
    }
    if let Some(mode) = status.get("mode").and_then(Value::as_str) {
        lines.push(format!("│ Mode: {}", mode));
    }
    if let Some(health) = status.get("health").and_then(Value::as_str) {
        lines.push(format!("│ Health: {}", health));
    }
    if let Some(metrics) = status.get("metrics") {
        lines.push("│ Metrics:".to_string());
        if let Some(temperature) = metrics.get("temperature").and_then(Value::as_f64) {
            lines.push(format!("│   Temperature: {:.2}°C", temperature));
        }
        if let Some(uptime) = metrics.get("uptime_secs").and_then(Value::as_u64) {
            lines.push(format!("│   Uptime: {}s", uptime));
        }
        if let Some(applied) = metrics.get("commands_applied").and_then(Value::as_u64) {
            lines.push(format!("│   Commands applied: {}", applied));
        }
    }

    lines.push(format!("└{}┘", "─".repeat(width)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_full_status() {
        let status = json!({
            "service": "Service1",
            "counter": 4,
            "active": false,
            "mode": "manual",
            "health": "inactive",
            "metrics": {"temperature": 25.0, "uptime_secs": 9, "commands_applied": 2}
        });

        let text = render_status("Service1", &status);
        assert!(text.starts_with("┌─ Service1 "));
        assert!(text.contains("│ Update #4"));
        assert!(text.contains("○ INACTIVE"));
        assert!(text.contains("│ Mode: manual"));
        assert!(text.contains("Temperature: 25.00°C"));
        assert!(text.contains("Commands applied: 2"));
    }

    #[test]
    fn test_render_foreign_document() {
        let text = render_status("x", &json!({"unrelated": true}));
        assert_eq!(text.lines().count(), 2);
    }
}
