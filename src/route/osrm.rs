//! OSRM routing backend
//!
//! Calls `route/v1/driving/{lon,lat;...}?geometries=geojson`. OSRM speaks
//! `lon,lat`; everything on our side is `lat,lon`, so both directions are
//! swapped here and nowhere else.

use crate::constants::api::USER_AGENT;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::route::{Route, RouteBackend};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// OSRM routing backend
#[derive(Debug, Clone)]
pub struct OsrmBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON LineString, `[lon, lat]` pairs
    coordinates: Vec<[f64; 2]>,
}

impl OsrmBackend {
    /// Create a new OSRM backend against `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, points: &[Coordinates]) -> String {
        let coords = points
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/driving/{}?geometries=geojson",
            self.base_url, coords
        )
    }

    fn parse(body: OsrmResponse) -> Result<Option<Route>> {
        if body.code == "NoRoute" {
            return Ok(None);
        }
        if body.code != "Ok" {
            return Err(Error::Routing(format!(
                "OSRM API error: {} - {}",
                body.code,
                body.message.unwrap_or_else(|| "No message".to_string())
            )));
        }

        Ok(body.routes.into_iter().next().map(|r| Route {
            path: r
                .geometry
                .coordinates
                .into_iter()
                .map(|[lon, lat]| Coordinates::new(lat, lon))
                .collect(),
            distance: r.distance,
            duration: r.duration,
        }))
    }
}

impl RouteBackend for OsrmBackend {
    async fn route(&self, points: &[Coordinates]) -> Result<Option<Route>> {
        if points.len() < 2 {
            return Ok(None);
        }
        for p in points {
            p.validate()?;
        }

        let url = self.route_url(points);
        debug!(%url, "osrm route");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Routing(format!("OSRM request failed: {}", e)))?;

        // OSRM reports errors like NoRoute with a 400 and a JSON body, so read the body either way
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Routing(format!("Failed to read OSRM response: {}", e)))?;

        let body: OsrmResponse = serde_json::from_str(&text).map_err(|_| {
            Error::Routing(format!("OSRM API returned status {}: {}", status, text))
        })?;

        Self::parse(body)
    }
}
