use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A single recorded position from a vehicle's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Time the position was recorded, if the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RoutePoint {
    /// Create a point without a timestamp
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: None,
        }
    }

    /// Create a point recorded at a specific time
    pub fn at(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Some(timestamp),
        }
    }

    /// Longitude/latitude pair in the order map libraries expect
    pub fn lon_lat(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

/// A position in the projected (planar) coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate
    pub fn dist_to(&self, other: Coordinate) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point `t` of the way from `self` to `other`
    pub fn lerp(&self, other: Coordinate, t: f64) -> Coordinate {
        Coordinate {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Recorded time between the first and last point, if both carry timestamps
pub fn recorded_span(points: &[RoutePoint]) -> Option<chrono::Duration> {
    let first = points.first()?.timestamp?;
    let last = points.last()?.timestamp?;
    Some(last - first)
}
