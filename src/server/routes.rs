//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::chain::{ChainStatus, ChainTrip};
use crate::coord::{Coordinates, Waypoint};
use crate::error::Error;
use crate::geo::{GeoBackend, GeoLocation};
use crate::itinerary::{self, Itinerary, ItineraryRequest};
use crate::route::{Route, RouteBackend};
use crate::server::state::AppState;
use crate::trip::{NewTrip, Trip, TripStatus};

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/itinerary/generate", post(itinerary_handler))
        .route("/api/trips", post(create_trip_handler).get(list_trips_handler))
        .route("/api/trips/:id", get(get_trip_handler))
        .route("/api/trips/:id/status", post(update_status_handler))
        .route("/api/trips/:id/stops", post(add_stop_handler))
        .route("/api/geocode", get(geocode_handler))
        .route("/api/reverse", get(reverse_handler))
        .route("/api/route", post(route_handler))
        .route("/api/chain/status", get(chain_status_handler))
        .route("/api/chain/trips/:id", get(chain_trip_handler))
        .route("/api/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::InvalidTransition { .. } => (StatusCode::BAD_REQUEST, "INVALID_TRANSITION"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::NotMirrored(_) => (StatusCode::CONFLICT, "NOT_MIRRORED"),
            Error::ChainRejected(_) => (StatusCode::CONFLICT, "CHAIN_REJECTED"),
            Error::ChainUninitialized => (StatusCode::SERVICE_UNAVAILABLE, "CHAIN_UNINITIALIZED"),
            Error::ChainUnavailable(_) => (StatusCode::BAD_GATEWAY, "CHAIN_UNAVAILABLE"),
            Error::Geocoding(_) => (StatusCode::BAD_GATEWAY, "GEOCODING_ERROR"),
            Error::Routing(_) => (StatusCode::BAD_GATEWAY, "ROUTING_ERROR"),
            Error::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
            status,
        }
    }
}

/// JSON body extractor whose rejections use the API error shape
///
/// Malformed or mistyped bodies become a 400 `VALIDATION_ERROR` instead of
/// axum's plain-text 400/415/422 responses.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(Error::Validation(rejection.body_text()).into()),
        }
    }
}

/// Generate an itinerary
///
/// POST /api/itinerary/generate
async fn itinerary_handler(
    ApiJson(req): ApiJson<ItineraryRequest>,
) -> Result<Json<Itinerary>, ApiError> {
    Ok(Json(itinerary::generate(&req)?))
}

/// Mirror outcome reported alongside a created trip
#[derive(Debug, Serialize, Deserialize)]
pub struct MirrorStatus {
    pub mirrored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTripResponse {
    pub trip: Trip,
    pub mirror: MirrorStatus,
}

/// Create a trip and mirror it on-chain
///
/// POST /api/trips
///
/// Returns 201 whenever the trip was saved, even if mirroring failed.
async fn create_trip_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewTrip>,
) -> Result<(StatusCode, Json<CreateTripResponse>), ApiError> {
    let outcome = state.trips.create_trip(req).await?;
    let mirror = MirrorStatus {
        mirrored: outcome.is_mirrored(),
        error: outcome.mirror_error.map(|e| e.to_string()),
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateTripResponse {
            trip: outcome.trip,
            mirror,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub owner: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TripsResponse {
    pub trips: Vec<Trip>,
    pub count: usize,
}

/// List trips, newest first
///
/// GET /api/trips?owner=
async fn list_trips_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TripsResponse>, ApiError> {
    let trips = state.trips.list(query.owner.as_deref()).await?;
    let count = trips.len();
    Ok(Json(TripsResponse { trips, count }))
}

/// GET /api/trips/:id
async fn get_trip_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Trip>, ApiError> {
    Ok(Json(state.trips.get(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Advance a trip's status once the ledger confirms
///
/// POST /api/trips/:id/status
async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<Trip>, ApiError> {
    let next: TripStatus = req.status.parse().map_err(Error::Validation)?;
    Ok(Json(state.trips.transition(&id, next).await?))
}

/// Append a stop to a PENDING trip
///
/// POST /api/trips/:id/stops
async fn add_stop_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(stop): ApiJson<Waypoint>,
) -> Result<Json<Trip>, ApiError> {
    Ok(Json(state.trips.append_stop(&id, stop).await?))
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub q: String,
}

/// Forward geocoding
///
/// GET /api/geocode?q=
async fn geocode_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeoLocation>, ApiError> {
    state
        .geocoder
        .geocode(&query.q)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("location '{}'", query.q)).into())
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Reverse geocoding
///
/// GET /api/reverse?lat=&lng=
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<GeoLocation>, ApiError> {
    Coordinates::new(query.lat, query.lng).validate()?;
    state
        .geocoder
        .reverse_geocode(query.lat, query.lng)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("address at {}, {}", query.lat, query.lng)).into())
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub coords: Vec<Coordinates>,
}

/// Driving route through the given points
///
/// POST /api/route
async fn route_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RouteRequest>,
) -> Result<Json<Route>, ApiError> {
    if req.coords.len() < 2 {
        return Err(Error::Validation("At least two coordinates are required".to_string()).into());
    }
    for point in &req.coords {
        point.validate()?;
    }

    state
        .router
        .route(&req.coords)
        .await?
        .map(Json)
        .ok_or_else(|| Error::NotFound("route between the given points".to_string()).into())
}

/// Chain readiness and trip count
///
/// GET /api/chain/status
async fn chain_status_handler(State(state): State<Arc<AppState>>) -> Json<ChainStatus> {
    Json(state.chain().status().await)
}

/// Read a trip straight from the ledger
///
/// GET /api/chain/trips/:id
async fn chain_trip_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ChainTrip>, ApiError> {
    Ok(Json(state.chain().get_trip(id).await?))
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    pub chain: ChainStatus,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain: state.chain().status().await,
    })
}
