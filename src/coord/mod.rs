//! Geographic primitives
//!
//! Coordinates travel on the wire as `[lat, lon]` arrays, matching what the
//! map front end sends and what the trip documents store.

pub mod point;

use serde::{Deserialize, Serialize};

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(crate::error::Error::Validation(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(crate::error::Error::Validation(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

/// A named point used as a start, stop, or destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub coords: Coordinates,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, coords: Coordinates) -> Self {
        Self {
            name: name.into(),
            coords,
        }
    }

    /// Require a non-empty name and in-range coordinates
    pub fn validate(&self, field: &str) -> crate::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::Error::Validation(format!(
                "{} name is required",
                field
            )));
        }
        self.coords.validate()
    }
}
