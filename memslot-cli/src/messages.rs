// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Documents exchanged by the CLI tools.
//!
//! Commands travel controller → service on the commands region, status
//! reports travel service → monitor on one region per service. Both are
//! plain JSON so non-Rust programs on the same host can take part.

use std::time::Duration;

use memslot_core::shm::header::current_timestamp_us;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A command understood by `memslot service`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    SetTemperature { value: f64 },
    SetMode { mode: String },
    ToggleActive,
    Shutdown,
}

impl Command {
    /// JSON document for the commands region, stamped with the send time.
    pub fn to_document(&self) -> Value {
        let mut doc = serde_json::to_value(self).unwrap_or_else(|_| json!({}));
        doc["timestamp"] = json!(current_timestamp_us());
        doc
    }

    /// Parse a received document. Extra keys such as `timestamp` are ignored.
    pub fn from_document(doc: &Value) -> Option<Self> {
        serde_json::from_value(doc.clone()).ok()
    }

    /// Command sent on step `counter` of the automated demo.
    pub fn demo(counter: u64) -> Self {
        match counter % 5 {
            0 => Self::SetTemperature {
                value: 20.0 + counter as f64,
            },
            1 => Self::SetMode {
                mode: "auto".to_string(),
            },
            3 => Self::SetMode {
                mode: "manual".to_string(),
            },
            _ => Self::ToggleActive,
        }
    }
}

/// One line of input to the interactive controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuChoice {
    Send(Command),
    /// Prompt for a raw JSON document.
    Custom,
    Quit,
    Unknown,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => Self::Send(Command::SetTemperature { value: 25.0 }),
            "2" => Self::Send(Command::SetMode {
                mode: "manual".to_string(),
            }),
            "3" => Self::Send(Command::SetMode {
                mode: "auto".to_string(),
            }),
            "4" => Self::Send(Command::ToggleActive),
            "5" => Self::Send(Command::Shutdown),
            "6" => Self::Custom,
            "q" | "quit" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

pub const MENU: &str = "\
Commands:
  1 - Set temperature to 25°C
  2 - Set mode to 'manual'
  3 - Set mode to 'auto'
  4 - Toggle active state
  5 - Shutdown service
  6 - Custom JSON command
  q - Quit";

/// Mutable state of a running service.
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub name: String,
    pub temperature: f64,
    pub active: bool,
    pub mode: String,
    pub running: bool,
    pub commands_applied: u64,
}

impl ServiceState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: 20.0,
            active: true,
            mode: "auto".to_string(),
            running: true,
            commands_applied: 0,
        }
    }

    /// Apply a command and describe the effect.
    pub fn apply(&mut self, command: &Command) -> String {
        self.commands_applied += 1;
        match command {
            Command::SetTemperature { value } => {
                self.temperature = *value;
                format!("Temperature set to {}°C", value)
            }
            Command::SetMode { mode } => {
                self.mode = mode.clone();
                format!("Mode set to {}", mode)
            }
            Command::ToggleActive => {
                self.active = !self.active;
                format!("Active state: {}", if self.active { "ON" } else { "OFF" })
            }
            Command::Shutdown => {
                self.running = false;
                "Shutdown requested".to_string()
            }
        }
    }

    pub fn health(&self) -> &'static str {
        if self.active {
            "healthy"
        } else {
            "inactive"
        }
    }

    /// Status document published on the service's status region.
    pub fn report(&self, counter: u64, uptime: Duration) -> StatusReport {
        StatusReport {
            service: self.name.clone(),
            timestamp: current_timestamp_us(),
            counter,
            active: self.active,
            mode: self.mode.clone(),
            health: self.health().to_string(),
            metrics: StatusMetrics {
                temperature: self.temperature,
                uptime_secs: uptime.as_secs(),
                commands_applied: self.commands_applied,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub service: String,
    pub timestamp: u64,
    pub counter: u64,
    pub active: bool,
    pub mode: String,
    pub health: String,
    pub metrics: StatusMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMetrics {
    pub temperature: f64,
    pub uptime_secs: u64,
    pub commands_applied: u64,
}

/// Sample document written by `memslot publish`.
pub fn sample_document(counter: u64) -> Value {
    json!({
        "timestamp": current_timestamp_us(),
        "counter": counter,
        "message": "Hello from writer",
        "data": {
            "temperature": 23.5 + (counter % 10) as f64,
            "humidity": 45.0 + (counter % 20) as f64,
            "pressure": 1013.25
        },
        "array": [1, 2, 3, 4, 5],
        "nested": {
            "level1": {
                "level2": {
                    "value": "deep value"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_document_shape() {
        let doc = Command::SetTemperature { value: 25.0 }.to_document();
        assert_eq!(doc["action"], "set_temperature");
        assert_eq!(doc["value"], 25.0);
        assert!(doc["timestamp"].as_u64().unwrap() > 0);

        let doc = Command::ToggleActive.to_document();
        assert_eq!(doc["action"], "toggle_active");
    }

    #[test]
    fn test_command_from_foreign_document() {
        let doc = json!({"action": "set_mode", "mode": "manual", "timestamp": 123});
        assert_eq!(
            Command::from_document(&doc),
            Some(Command::SetMode {
                mode: "manual".to_string()
            })
        );
        assert_eq!(Command::from_document(&json!({"action": "dance"})), None);
        assert_eq!(Command::from_document(&json!({"value": 1})), None);
    }

    #[test]
    fn test_demo_cycle() {
        assert_eq!(
            Command::demo(0),
            Command::SetTemperature { value: 20.0 }
        );
        assert_eq!(
            Command::demo(1),
            Command::SetMode {
                mode: "auto".to_string()
            }
        );
        assert_eq!(Command::demo(2), Command::ToggleActive);
        assert_eq!(
            Command::demo(3),
            Command::SetMode {
                mode: "manual".to_string()
            }
        );
        assert_eq!(Command::demo(4), Command::ToggleActive);
        assert_eq!(
            Command::demo(5),
            Command::SetTemperature { value: 25.0 }
        );
    }

    #[test]
    fn test_menu_parsing() {
        assert_eq!(MenuChoice::parse("5"), MenuChoice::Send(Command::Shutdown));
        assert_eq!(MenuChoice::parse(" 6 "), MenuChoice::Custom);
        assert_eq!(MenuChoice::parse("quit"), MenuChoice::Quit);
        assert_eq!(MenuChoice::parse("x"), MenuChoice::Unknown);
    }

    #[test]
    fn test_service_applies_commands() {
        let mut state = ServiceState::new("Service1");

        state.apply(&Command::SetTemperature { value: 25.0 });
        state.apply(&Command::SetMode {
            mode: "manual".to_string(),
        });
        state.apply(&Command::ToggleActive);

        assert_eq!(state.temperature, 25.0);
        assert_eq!(state.mode, "manual");
        assert!(!state.active);
        assert_eq!(state.health(), "inactive");
        assert!(state.running);

        state.apply(&Command::Shutdown);
        assert!(!state.running);
        assert_eq!(state.commands_applied, 4);
    }

    #[test]
    fn test_status_report_roundtrip_through_json() {
        let state = ServiceState::new("Service1");
        let report = state.report(7, Duration::from_secs(3));
        assert_eq!(report.counter, 7);
        assert_eq!(report.metrics.uptime_secs, 3);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["health"], "healthy");
        assert_eq!(value["metrics"]["temperature"], 20.0);
    }

    #[test]
    fn test_sample_document() {
        let doc = sample_document(12);
        assert_eq!(doc["counter"], 12);
        assert_eq!(doc["data"]["temperature"], 25.5);
        assert_eq!(doc["data"]["humidity"], 57.0);
        assert_eq!(doc["nested"]["level1"]["level2"]["value"], "deep value");
    }
}
