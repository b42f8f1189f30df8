//! Nominatim geocoding backend (OpenStreetMap)
//!
//! Uses the free Nominatim API for geocoding.
//! Rate limit: 1 request per second (enforced by User-Agent requirement)

use crate::constants::api::USER_AGENT;
use crate::error::{Error, Result};
use crate::geo::{GeoBackend, GeoLocation};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim search response item
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimBackend {
    /// Create a new Nominatim backend against `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Parse lat/lng strings to f64
    fn parse_coords(lat: &str, lng: &str) -> Result<(f64, f64)> {
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid longitude: {}", lng)))?;
        Ok((lat, lng))
    }

    fn into_location(result: NominatimResult) -> Result<GeoLocation> {
        let (lat, lng) = Self::parse_coords(&result.lat, &result.lon)?;
        Ok(GeoLocation {
            lat,
            lng,
            display_name: result.display_name,
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    fn reverse_url(&self, lat: f64, lng: f64) -> String {
        format!("{}/reverse?lat={}&lon={}&format=json", self.base_url, lat, lng)
    }
}

impl GeoBackend for NominatimBackend {
    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Please enter a location name".to_string()));
        }

        let url = self.search_url(query);
        debug!(%url, "nominatim search");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geocoding(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to parse Nominatim response: {}", e)))?;

        results.into_iter().next().map(Self::into_location).transpose()
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<GeoLocation>> {
        let url = self.reverse_url(lat, lng);
        debug!(%url, "nominatim reverse");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            return Err(Error::Geocoding(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to parse Nominatim response: {}", e)))?;

        // Nominatim answers misses with `{"error": "Unable to geocode"}` and a 200
        if body.get("error").is_some() {
            return Ok(None);
        }

        let result: NominatimResult = serde_json::from_value(body)?;
        Self::into_location(result).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coords() {
        let (lat, lng) = NominatimBackend::parse_coords("40.7128", "-74.0060").unwrap();
        assert!((lat - 40.7128).abs() < 0.0001);
        assert!((lng - (-74.0060)).abs() < 0.0001);
    }

    #[test]
    fn test_parse_coords_invalid() {
        assert!(NominatimBackend::parse_coords("invalid", "0").is_err());
        assert!(NominatimBackend::parse_coords("0", "invalid").is_err());
    }

    #[test]
    fn test_urls() {
        let backend = NominatimBackend::new("https://nominatim.example/").unwrap();

        assert_eq!(
            backend.search_url("São Paulo"),
            "https://nominatim.example/search?q=S%C3%A3o%20Paulo&format=json&limit=1"
        );
        assert_eq!(
            backend.reverse_url(1.5, -2.25),
            "https://nominatim.example/reverse?lat=1.5&lon=-2.25&format=json"
        );
    }

    #[tokio::test]
    async fn test_empty_query_rejected_without_request() {
        let backend = NominatimBackend::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            backend.geocode("   ").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires network access to Nominatim"]
    async fn test_geocode_live() {
        let backend = NominatimBackend::new(crate::constants::api::NOMINATIM_URL).unwrap();
        let loc = backend.geocode("Eiffel Tower").await.unwrap().unwrap();
        assert!((loc.lat - 48.858).abs() < 0.1);
    }
}
