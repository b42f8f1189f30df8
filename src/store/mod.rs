//! Trip record storage
//!
//! [`TripStore`] is the seam between the lifecycle coordinator and wherever
//! trip documents live. The shipped implementation is a JSON document file.

pub mod json;

use crate::coord::Waypoint;
use crate::error::Result;
use crate::trip::{ChainMetadata, Trip, TripStatus};
use async_trait::async_trait;

pub use json::JsonTripStore;

/// Persistence for trip documents
///
/// Mutating calls return the updated document. Failed writes leave the
/// stored document untouched.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Persist a new trip
    async fn insert(&self, trip: Trip) -> Result<Trip>;

    /// Fetch a trip by record-store id
    async fn get(&self, id: &str) -> Result<Option<Trip>>;

    /// List trips, newest first, optionally restricted to one owner
    async fn list(&self, owner: Option<&str>) -> Result<Vec<Trip>>;

    /// Attach chain metadata
    ///
    /// Fails if the trip already carries a different on-chain id.
    async fn set_chain_metadata(&self, id: &str, chain: ChainMetadata) -> Result<Trip>;

    /// Move `id` from `expected` to `next`, recording the status transaction hash
    ///
    /// Compare-and-set: fails with `InvalidTransition` if the stored status is
    /// no longer `expected`.
    async fn update_status(
        &self,
        id: &str,
        expected: TripStatus,
        next: TripStatus,
        tx_hash: &str,
    ) -> Result<Trip>;

    /// Append a stop to a PENDING trip
    async fn append_stop(&self, id: &str, stop: Waypoint) -> Result<Trip>;
}
