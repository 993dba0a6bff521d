//! Device role selected at startup

use serde::{Deserialize, Serialize};

/// What a node does besides exporting telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Publishes named content on button press or timer. Text panel display.
    Originator,
    /// Gates radio availability on ambient light. Text panel display.
    SensorGate,
    /// Caching node with an LED bar showing name cache occupancy.
    #[default]
    DisplayOnly,
}

impl DeviceRole {
    pub fn publishes(self) -> bool {
        matches!(self, DeviceRole::Originator)
    }

    pub fn gates_channel(self) -> bool {
        matches!(self, DeviceRole::SensorGate)
    }

    pub fn uses_text_panel(self) -> bool {
        matches!(self, DeviceRole::Originator | DeviceRole::SensorGate)
    }
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceRole::Originator => "originator",
            DeviceRole::SensorGate => "sensor_gate",
            DeviceRole::DisplayOnly => "display_only",
        };
        f.write_str(name)
    }
}
