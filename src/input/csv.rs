use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use crate::core::RoutePoint;
use chrono::{DateTime, Utc};

/// Load a route history from a CSV file
///
/// Supports flexible column names:
/// - latitude,longitude[,timestamp]
/// - lat,lon[,time]
/// - ts,lat,lng
///
/// Timestamps are optional; when present they must be RFC 3339.
pub fn load_csv(path: &str) -> Result<Vec<RoutePoint>> {
    let file = std::fs::File::open(Path::new(path))
        .with_context(|| format!("Failed to open route file: {}", path))?;
    read_csv(file)
}

/// Parse route points from any CSV reader
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RoutePoint>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?;
    let (lat_idx, lon_idx, time_idx) = detect_columns(headers)?;

    let mut points = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read CSV row")?;
        // Header is line 1
        let line = row + 2;

        let latitude = parse_float(record.get(lat_idx), "latitude", line)?;
        let longitude = parse_float(record.get(lon_idx), "longitude", line)?;

        let timestamp = match time_idx.and_then(|idx| record.get(idx)) {
            Some(s) if !s.trim().is_empty() => Some(
                DateTime::parse_from_rfc3339(s.trim())
                    .with_context(|| format!("Bad timestamp {:?} on line {}", s, line))?
                    .with_timezone(&Utc),
            ),
            _ => None,
        };

        points.push(RoutePoint {
            latitude,
            longitude,
            timestamp,
        });
    }

    Ok(points)
}

fn parse_float(field: Option<&str>, column: &str, line: usize) -> Result<f64> {
    let field = field.with_context(|| format!("Missing {} on line {}", column, line))?;
    field
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Bad {} {:?} on line {}", column, field, line))
}

/// Detect column indices from CSV headers
fn detect_columns(headers: &csv::StringRecord) -> Result<(usize, usize, Option<usize>)> {
    let lat_idx = find_column(headers, &["latitude", "lat"])?;
    let lon_idx = find_column(headers, &["longitude", "lon", "lng", "long"])?;
    let time_idx = find_column(headers, &["timestamp", "time", "ts", "t"]).ok();

    Ok((lat_idx, lon_idx, time_idx))
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }

    anyhow::bail!("Could not find column with names: {:?}", names)
}
