//! Geocoding module
//!
//! Resolves free-text place names to coordinates and back.

pub mod nominatim;

use crate::coord::{Coordinates, Waypoint};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A geocoded location result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
    /// Display name (address or description)
    pub display_name: String,
}

impl GeoLocation {
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    /// Convert into a named waypoint usable as a trip start, stop, or destination
    pub fn into_waypoint(self) -> Waypoint {
        let coords = self.coords();
        Waypoint::new(self.display_name, coords)
    }
}

/// Trait for geocoding backends
pub trait GeoBackend: Send + Sync {
    /// Geocode a location string to coordinates
    ///
    /// Returns the best match for the query, or None if not found
    fn geocode(&self, query: &str) -> impl std::future::Future<Output = Result<Option<GeoLocation>>> + Send;

    /// Reverse geocode coordinates to a location name
    fn reverse_geocode(&self, lat: f64, lng: f64) -> impl std::future::Future<Output = Result<Option<GeoLocation>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_location_serialization() {
        let loc = GeoLocation {
            lat: 40.7128,
            lng: -74.0060,
            display_name: "New York City".to_string(),
        };

        let json = serde_json::to_string(&loc).unwrap();
        let parsed: GeoLocation = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, loc);
    }

    #[test]
    fn test_into_waypoint() {
        let loc = GeoLocation {
            lat: 51.5074,
            lng: -0.1278,
            display_name: "London".to_string(),
        };

        let wp = loc.into_waypoint();
        assert_eq!(wp.name, "London");
        assert_eq!(wp.coords, Coordinates::new(51.5074, -0.1278));
    }
}
