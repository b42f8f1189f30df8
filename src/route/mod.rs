//! Driving routes
//!
//! Resolves an ordered list of waypoints into a drivable path with total
//! distance and duration.

pub mod osrm;

use crate::coord::Coordinates;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A resolved driving route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Path geometry as `[lat, lon]` points
    pub path: Vec<Coordinates>,
    /// Distance in meters
    pub distance: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl Route {
    /// Duration rendered as "1h 23m" / "45m"
    pub fn duration_label(&self) -> String {
        format_duration(self.duration)
    }

    /// Distance rendered in kilometers
    pub fn distance_label(&self) -> String {
        format!("{:.1} km", self.distance / 1000.0)
    }
}

/// Trait for routing backends
pub trait RouteBackend: Send + Sync {
    /// Route through `points` in order
    ///
    /// Returns None when fewer than two points are given or no route exists
    fn route(&self, points: &[Coordinates]) -> impl std::future::Future<Output = Result<Option<Route>>> + Send;
}

/// Render seconds as hours and minutes
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "N/A".to_string();
    }
    let total_minutes = (seconds / 60.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
