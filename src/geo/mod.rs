//! Projection from geographic lon/lat into the planar space curves are built in.
//!
//! Real map projections belong to the renderer's geo library; the engine only
//! needs something implementing [`Projection`]. Closures work too, so a caller
//! can pass its map library's `from_lon_lat` straight through.

use crate::core::{Coordinate, RoutePoint};

/// Failure reported by a projection for a malformed point
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("coordinate is not finite: lat={latitude}, lon={longitude}")]
    NonFinite { latitude: f64, longitude: f64 },

    #[error("coordinate out of range: lat={latitude}, lon={longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },

    #[error("projection failed: {0}")]
    Other(String),
}

/// Capability turning a route point into a planar coordinate
pub trait Projection {
    fn project(&self, point: &RoutePoint) -> Result<Coordinate, ProjectionError>;
}

impl<F> Projection for F
where
    F: Fn(&RoutePoint) -> Result<Coordinate, ProjectionError>,
{
    fn project(&self, point: &RoutePoint) -> Result<Coordinate, ProjectionError> {
        self(point)
    }
}

/// Plate carrée: x = longitude, y = latitude, after range checks
#[derive(Debug, Clone, Copy, Default)]
pub struct LonLat;

impl Projection for LonLat {
    fn project(&self, point: &RoutePoint) -> Result<Coordinate, ProjectionError> {
        let (longitude, latitude) = point.lon_lat();
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(ProjectionError::NonFinite { latitude, longitude });
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ProjectionError::OutOfRange { latitude, longitude });
        }
        Ok(Coordinate::new(longitude, latitude))
    }
}
