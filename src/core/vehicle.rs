use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of a vehicle as reported by the fleet feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    /// Registration number, used as the key for history lookups
    pub vehicle_no: String,

    pub latitude: f64,

    pub longitude: f64,

    /// Free-form status text ("Moving", "Idle since 10:00", ...)
    #[serde(default)]
    pub status: String,

    /// Body type (truck, van, ...)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
}

impl VehicleSnapshot {
    pub fn status_kind(&self) -> VehicleStatus {
        VehicleStatus::parse(&self.status)
    }

    /// List glyph for the body type
    pub fn icon(&self) -> &'static str {
        match self.vehicle_type.as_deref().map(str::to_lowercase).as_deref() {
            Some("truck") => "🚚",
            Some("van") => "🚐",
            Some("refrigerated") => "🧊",
            Some("flatbed") => "🛻",
            _ => "🚗",
        }
    }
}

/// Coarse classification of the status text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleStatus {
    Moving,
    Idle,
    Loading,
    Other(String),
}

impl VehicleStatus {
    /// Classify by substring, so "Idle (20 min)" still counts as idle
    pub fn parse(status: &str) -> Self {
        if status.contains("Moving") {
            VehicleStatus::Moving
        } else if status.contains("Idle") {
            VehicleStatus::Idle
        } else if status.contains("Loading") {
            VehicleStatus::Loading
        } else {
            VehicleStatus::Other(status.to_string())
        }
    }

    /// Marker color used by map renderers
    pub fn color(&self) -> &'static str {
        match self {
            VehicleStatus::Moving => "#4CAF50",
            VehicleStatus::Idle => "#F44336",
            VehicleStatus::Loading => "#FFC107",
            VehicleStatus::Other(_) => "#2196F3",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Moving => write!(f, "Moving"),
            VehicleStatus::Idle => write!(f, "Idle"),
            VehicleStatus::Loading => write!(f, "Loading"),
            VehicleStatus::Other(s) if s.is_empty() => write!(f, "Unknown"),
            VehicleStatus::Other(s) => write!(f, "{}", s),
        }
    }
}
