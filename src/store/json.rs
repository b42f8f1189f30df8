//! JSON file trip store
//!
//! Documents are kept in memory and the whole collection is rewritten to
//! disk after every mutation (XDG data dir, `trips.json` by default). A store
//! without a path never touches the filesystem.

use crate::config::defaults::APP_DIR_NAME;
use crate::config::StorageConfig;
use crate::coord::Waypoint;
use crate::error::{Error, Result};
use crate::store::TripStore;
use crate::trip::{ChainMetadata, Trip, TripStatus};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

const TRIPS_FILE_NAME: &str = "trips.json";

/// File-backed trip document store
#[derive(Debug)]
pub struct JsonTripStore {
    trips: RwLock<Vec<Trip>>,
    path: Option<PathBuf>,
}

impl JsonTripStore {
    /// Get the default trips file path
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join(APP_DIR_NAME).join(TRIPS_FILE_NAME))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }

    /// Configured trips file, or the default location
    pub fn configured_path(storage: &StorageConfig) -> Result<PathBuf> {
        match &storage.trips_file {
            Some(path) => Ok(path.clone()),
            None => Self::default_path(),
        }
    }

    /// Open the store at `path`, loading existing documents
    pub async fn open(path: PathBuf) -> Result<Self> {
        let exists = fs::try_exists(&path)
            .await
            .map_err(|e| Error::Persistence(format!("Failed to inspect trips file: {}", e)))?;
        let trips = if exists {
            let raw = fs::read(&path)
                .await
                .map_err(|e| Error::Persistence(format!("Failed to read trips file: {}", e)))?;
            if raw.is_empty() {
                Vec::new()
            } else {
                serde_json::from_slice(&raw).map_err(|e| {
                    Error::Persistence(format!("Failed to parse trips file: {}", e))
                })?
            }
        } else {
            Vec::new()
        };

        debug!(path = %path.display(), count = trips.len(), "opened trip store");

        Ok(Self {
            trips: RwLock::new(trips),
            path: Some(path),
        })
    }

    /// A store that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            trips: RwLock::new(Vec::new()),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, trips: &[Trip]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::Persistence(format!("Failed to create data directory: {}", e))
            })?;
        }

        let data = serde_json::to_vec_pretty(trips)?;

        // Write-then-rename so a crash never leaves a truncated file behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .await
            .map_err(|e| Error::Persistence(format!("Failed to write trips file: {}", e)))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::Persistence(format!("Failed to replace trips file: {}", e)))?;

        Ok(())
    }

    /// Apply `f` to one trip and persist; the in-memory copy only changes if the write succeeds
    async fn modify<F>(&self, id: &str, f: F) -> Result<Trip>
    where
        F: FnOnce(&mut Trip) -> Result<()> + Send,
    {
        let mut trips = self.trips.write().await;
        let idx = trips
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("trip {}", id)))?;

        let mut updated = trips[idx].clone();
        f(&mut updated)?;

        let mut next = trips.clone();
        next[idx] = updated.clone();
        self.persist(&next).await?;
        *trips = next;

        Ok(updated)
    }
}

#[async_trait]
impl TripStore for JsonTripStore {
    async fn insert(&self, trip: Trip) -> Result<Trip> {
        let mut trips = self.trips.write().await;
        if trips.iter().any(|t| t.id == trip.id) {
            return Err(Error::Persistence(format!("Duplicate trip id: {}", trip.id)));
        }

        let mut next = trips.clone();
        next.push(trip.clone());
        self.persist(&next).await?;
        *trips = next;

        Ok(trip)
    }

    async fn get(&self, id: &str) -> Result<Option<Trip>> {
        let trips = self.trips.read().await;
        Ok(trips.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<Trip>> {
        let trips = self.trips.read().await;
        let mut items: Vec<Trip> = trips
            .iter()
            .filter(|t| owner.map_or(true, |o| t.owner == o))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn set_chain_metadata(&self, id: &str, chain: ChainMetadata) -> Result<Trip> {
        self.modify(id, |trip| {
            if let Some(existing) = trip.on_chain_trip_id() {
                if chain.on_chain_trip_id != Some(existing) {
                    return Err(Error::Persistence(format!(
                        "Trip {} is already mirrored as on-chain trip {}",
                        trip.id, existing
                    )));
                }
            }
            trip.chain = Some(chain);
            Ok(())
        })
        .await
    }

    async fn update_status(
        &self,
        id: &str,
        expected: TripStatus,
        next: TripStatus,
        tx_hash: &str,
    ) -> Result<Trip> {
        self.modify(id, |trip| {
            if trip.status != expected {
                return Err(Error::InvalidTransition {
                    from: trip.status.to_string(),
                    to: next.to_string(),
                });
            }
            trip.status = next;
            if let Some(chain) = trip.chain.as_mut() {
                chain.status_transaction_hash = Some(tx_hash.to_string());
            }
            Ok(())
        })
        .await
    }

    async fn append_stop(&self, id: &str, stop: Waypoint) -> Result<Trip> {
        self.modify(id, |trip| {
            if trip.status != TripStatus::Pending {
                return Err(Error::Validation(format!(
                    "Stops can only be added while the trip is PENDING (currently {})",
                    trip.status
                )));
            }
            trip.stops.push(stop);
            Ok(())
        })
        .await
    }
}
