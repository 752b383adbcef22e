pub mod clock;
pub mod controller;
pub mod driver;
pub mod interpolate;
pub mod path;

pub use clock::{PlaybackClock, BASE_DURATION_MS};
pub use controller::{PlaybackController, TickToken};
pub use driver::{DriverError, PlaybackDriver, PlaybackHandle};
pub use interpolate::position_at;
pub use path::{Curve, PathBuilder};

use crate::core::Coordinate;
use serde::Serialize;

/// Lifecycle of a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl PlaybackState {
    /// Completed and Cancelled stay put until a reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Completed | PlaybackState::Cancelled)
    }
}

/// Where the replayed vehicle is at one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 0.0 = start of route, 1.0 = end
    pub fraction: f64,
    pub position: Coordinate,
}

impl ProgressEvent {
    /// Fraction as a percentage for progress bars
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

/// Item delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PlaybackEvent {
    Progress(ProgressEvent),
    /// Natural end of a session. Never sent for a stop or reset.
    Complete,
}
