//! Vehicle route history playback.
//!
//! A route history (`RoutePoint`s) is turned into a [`playback::Curve`] and
//! replayed as a timed animation by a [`playback::PlaybackController`], which
//! emits fractional progress and interpolated positions to subscribers.

pub mod config;
pub mod core;
pub mod geo;
pub mod input;
pub mod playback;
pub mod source;

pub use crate::core::{Coordinate, PlaybackError, RoutePoint, VehicleSnapshot};
pub use crate::playback::{PlaybackController, PlaybackEvent, PlaybackState, ProgressEvent};
