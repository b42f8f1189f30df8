//! Trip lifecycle coordination
//!
//! The coordinator sequences record-store writes and ledger writes. Creation
//! persists first and mirrors second, so a ledger outage never loses a trip.
//! Status changes go the other way: the ledger must confirm before the store
//! is touched.
//!
//! Operations on one trip id are serialized through a per-trip lock.

use crate::chain::ChainAdapter;
use crate::coord::Waypoint;
use crate::error::{Error, Result};
use crate::store::TripStore;
use crate::trip::{ChainMetadata, NewTrip, Trip, TripStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive hold on one trip id
///
/// Dropping it releases the lock and forgets the id once nobody else holds
/// or waits on it, so the map only tracks trips with operations in flight.
struct TripLock<'a> {
    locks: &'a LockMap,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TripLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

/// Outcome of creating a trip
///
/// The trip is always persisted; `mirror_error` is set when the ledger write
/// (or recording its result) failed.
#[derive(Debug)]
pub struct CreateOutcome {
    pub trip: Trip,
    pub mirror_error: Option<Error>,
}

impl CreateOutcome {
    pub fn is_mirrored(&self) -> bool {
        self.mirror_error.is_none() && self.trip.chain.is_some()
    }
}

/// Coordinates the trip store and the chain adapter
pub struct TripCoordinator {
    store: Arc<dyn TripStore>,
    chain: Arc<ChainAdapter>,
    locks: LockMap,
}

impl TripCoordinator {
    pub fn new(store: Arc<dyn TripStore>, chain: Arc<ChainAdapter>) -> Self {
        Self {
            store,
            chain,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn chain(&self) -> &Arc<ChainAdapter> {
        &self.chain
    }

    async fn lock_trip(&self, id: &str) -> TripLock<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(id.to_string()).or_default().clone()
        };
        // Built before awaiting so a cancelled wait still cleans up the entry
        let mut held = TripLock {
            locks: &self.locks,
            id: id.to_string(),
            guard: None,
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// Persist a new PENDING trip, then mirror it on-chain
    pub async fn create_trip(&self, new_trip: NewTrip) -> Result<CreateOutcome> {
        let trip = self.store.insert(new_trip.into_trip()?).await?;
        let _held = self.lock_trip(&trip.id).await;

        info!(id = %trip.id, owner = %trip.owner, "trip saved");

        let created = match self.chain.create_trip(&trip.chain_summary()).await {
            Ok(created) => created,
            Err(e) => {
                warn!(id = %trip.id, error = %e, "trip saved but not mirrored on-chain");
                return Ok(CreateOutcome {
                    trip,
                    mirror_error: Some(e),
                });
            }
        };

        let chain = ChainMetadata {
            transaction_hash: created.transaction_hash,
            on_chain_trip_id: created.on_chain_trip_id,
            contract_address: self.chain.contract_address(),
            status_transaction_hash: None,
        };
        if chain.on_chain_trip_id.is_none() {
            warn!(id = %trip.id, hash = %chain.transaction_hash, "TripCreated event missing; on-chain id unknown");
        }

        match self.store.set_chain_metadata(&trip.id, chain).await {
            Ok(trip) => {
                info!(id = %trip.id, on_chain_id = ?trip.on_chain_trip_id(), "trip mirrored");
                Ok(CreateOutcome {
                    trip,
                    mirror_error: None,
                })
            }
            Err(e) => {
                warn!(id = %trip.id, error = %e, "trip mirrored but chain metadata not saved");
                Ok(CreateOutcome {
                    trip,
                    mirror_error: Some(e),
                })
            }
        }
    }

    /// Move a trip to `next` once the ledger confirms the change
    pub async fn transition(&self, id: &str, next: TripStatus) -> Result<Trip> {
        let _held = self.lock_trip(id).await;

        let trip = self.get(id).await?;
        trip.status.check_transition(next)?;
        let on_chain_id = trip
            .on_chain_trip_id()
            .ok_or_else(|| Error::NotMirrored(trip.id.clone()))?;

        let hash = self.chain.update_status(on_chain_id, next).await?;
        let updated = self
            .store
            .update_status(id, trip.status, next, &hash)
            .await?;

        info!(id, from = %trip.status, to = %next, %hash, "trip status updated");
        Ok(updated)
    }

    /// Add a stop to a PENDING trip
    pub async fn append_stop(&self, id: &str, stop: Waypoint) -> Result<Trip> {
        stop.validate("stop")?;
        let _held = self.lock_trip(id).await;
        self.store.append_stop(id, stop).await
    }

    pub async fn get(&self, id: &str) -> Result<Trip> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("trip {}", id)))
    }

    /// Trips newest first, optionally for one owner
    pub async fn list(&self, owner: Option<&str>) -> Result<Vec<Trip>> {
        self.store.list(owner).await
    }
}
