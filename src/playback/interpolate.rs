use crate::core::Coordinate;
use crate::playback::path::Curve;

/// Position `fraction` of the way along the curve, by arc length
///
/// The fraction is clamped to [0, 1] (NaN counts as 0), so drift past the end
/// of an animation lands exactly on the last point.
pub fn position_at(curve: &Curve, fraction: f64) -> Coordinate {
    let points = curve.points();
    let (first, last) = curve.endpoints();

    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    if curve.is_degenerate() || fraction <= 0.0 {
        return first;
    }
    if fraction >= 1.0 {
        return last;
    }

    let cumulative = curve.cumulative_lengths();
    let target = fraction * curve.total_length();

    // First vertex at or beyond the target distance. Zero-length segments
    // never bracket a target, since their start already satisfies `d >= target`.
    let idx = cumulative.partition_point(|&d| d < target);
    if idx == 0 {
        return first;
    }
    if idx >= points.len() {
        return last;
    }

    let (d0, d1) = (cumulative[idx - 1], cumulative[idx]);
    let t = (target - d0) / (d1 - d0);
    points[idx - 1].lerp(points[idx], t)
}

/// Index of the segment `[i, i + 1]` holding the given fraction
pub fn segment_at(curve: &Curve, fraction: f64) -> usize {
    if curve.len() < 2 || curve.is_degenerate() {
        return 0;
    }
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let target = fraction * curve.total_length();
    let idx = curve.cumulative_lengths().partition_point(|&d| d < target);
    idx.saturating_sub(1).min(curve.len() - 2)
}
