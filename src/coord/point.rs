//! Point math: interpolation and great-circle distance

use crate::coord::Coordinates;
use std::f64::consts::PI;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Linearly interpolate between two coordinates
///
/// Latitude and longitude are interpolated independently:
/// `start + (end - start) * t`. No great-circle correction is applied.
pub fn interpolate(start: Coordinates, end: Coordinates, t: f64) -> Coordinates {
    Coordinates::new(
        start.lat + (end.lat - start.lat) * t,
        start.lng + (end.lng - start.lng) * t,
    )
}

/// Calculate the distance between two points in meters (Haversine formula)
pub fn haversine_distance(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat * PI / 180.0;
    let lat2 = p2.lat * PI / 180.0;
    let delta_lat = (p2.lat - p1.lat) * PI / 180.0;
    let delta_lng = (p2.lng - p1.lng) * PI / 180.0;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Total straight-line length of a path in meters
pub fn path_length(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(w[0], w[1]))
        .sum()
}
