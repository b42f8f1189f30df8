//! Centralized constants for the trip-ledger crate

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// Public OSRM demo server
    pub const OSRM_URL: &str = "https://router.project-osrm.org";

    /// User agent sent to third-party services (Nominatim requires one)
    pub const USER_AGENT: &str = concat!("trip-ledger/", env!("CARGO_PKG_VERSION"));
}

/// Itinerary generation limits
pub mod itinerary {
    /// Fewest days an itinerary can span
    pub const MIN_DAYS: i64 = 1;

    /// Most days an itinerary can span
    pub const MAX_DAYS: i64 = 7;

    /// Note text used when no preferences are given
    pub const GENERAL_PREFERENCES: &str = "general";
}

/// TripRegistry contract interface
///
/// `UPDATE_STATUS` and `TRIP_CREATED_EVENT` are only defaults; deployments
/// whose ABI differs override them in the `[chain]` config section.
pub mod contract {
    pub const CREATE_TRIP: &str = "createTrip(string)";
    pub const UPDATE_STATUS: &str = "updateStatus(uint256,uint256)";
    pub const GET_TRIP: &str = "getTrip(uint256)";
    pub const TOTAL_TRIPS: &str = "totalTrips()";
    pub const TRIP_CREATED_EVENT: &str = "TripCreated(uint256,address,string)";

    /// Safety margin applied on top of `eth_estimateGas`, in percent
    pub const GAS_MARGIN_PERCENT: u64 = 20;
}
