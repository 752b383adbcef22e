pub mod csv;
pub mod json;

pub use csv::load_csv;
pub use json::load_json;

use anyhow::{Context, Result};
use std::path::Path;
use crate::core::RoutePoint;

/// Input format detection result
#[derive(Debug, Clone, PartialEq)]
pub enum InputFormat {
    Csv,
    Json,
    Unknown,
}

/// Detect the format of a route file from its first bytes
pub fn detect_format(data: &[u8]) -> InputFormat {
    if is_json(data) {
        return InputFormat::Json;
    }

    if is_csv(data) {
        return InputFormat::Csv;
    }

    InputFormat::Unknown
}

fn is_json(data: &[u8]) -> bool {
    matches!(
        data.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'[') | Some(b'{')
    )
}

fn is_csv(data: &[u8]) -> bool {
    // A header line with at least one comma (latitude,longitude)
    let sample = std::str::from_utf8(&data[..data.len().min(500)]);
    match sample {
        Ok(text) => text.lines().next().map_or(false, |line| line.contains(',')),
        Err(_) => false,
    }
}

/// Load a route history from a file, auto-detecting format
pub fn load_route<P: AsRef<Path>>(path: P) -> Result<Vec<RoutePoint>> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read route file: {:?}", path))?;

    match detect_format(&data) {
        InputFormat::Csv => self::csv::read_csv(data.as_slice())
            .with_context(|| format!("Invalid route file: {:?}", path)),
        InputFormat::Json => {
            let content = String::from_utf8(data)
                .with_context(|| format!("Route file is not UTF-8: {:?}", path))?;
            self::json::parse_json(&content).with_context(|| format!("Invalid route file: {:?}", path))
        }
        InputFormat::Unknown => anyhow::bail!("Unknown route format: {:?}", path),
    }
}
