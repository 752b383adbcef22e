use anyhow::{Context, Result};
use serde::Deserialize;
use crate::core::RoutePoint;

/// Either a bare array of points or an object wrapping one
#[derive(Deserialize)]
#[serde(untagged)]
enum RouteDocument {
    Points(Vec<RoutePoint>),
    Wrapped { points: Vec<RoutePoint> },
}

/// Load a route from JSON
///
/// Accepts `[{ "latitude": .., "longitude": .., "timestamp": .. }, ...]` or the
/// same array under a `"points"` key. Timestamps are optional RFC 3339 strings.
pub fn load_json(path: &str) -> Result<Vec<RoutePoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read route file: {}", path))?;
    parse_json(&content).with_context(|| format!("Invalid route file: {}", path))
}

pub fn parse_json(content: &str) -> Result<Vec<RoutePoint>> {
    let document: RouteDocument = serde_json::from_str(content)?;
    Ok(match document {
        RouteDocument::Points(points) => points,
        RouteDocument::Wrapped { points } => points,
    })
}
