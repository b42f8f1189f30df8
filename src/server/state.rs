//! Server shared state
//!
//! Holds configuration, the trip coordinator and the map service clients.

use crate::chain::ChainAdapter;
use crate::config::Config;
use crate::error::Result;
use crate::geo::nominatim::NominatimBackend;
use crate::lifecycle::TripCoordinator;
use crate::route::osrm::OsrmBackend;
use crate::store::{JsonTripStore, TripStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Config>>,

    /// Trip lifecycle (store plus chain adapter)
    pub trips: TripCoordinator,

    pub geocoder: NominatimBackend,

    pub router: OsrmBackend,
}

impl AppState {
    /// Build state from configuration, opening the trips file
    pub async fn new(config: Config) -> Result<Self> {
        let store = JsonTripStore::open(JsonTripStore::configured_path(&config.storage)?).await?;
        if let Some(path) = store.path() {
            info!(path = %path.display(), "trip store ready");
        }

        let chain = ChainAdapter::from_settings(config.chain.settings());
        Self::with_parts(config, Arc::new(store), Arc::new(chain))
    }

    /// Build state around an existing store and chain adapter
    pub fn with_parts(
        config: Config,
        store: Arc<dyn TripStore>,
        chain: Arc<ChainAdapter>,
    ) -> Result<Self> {
        let geocoder = NominatimBackend::new(config.services.nominatim_url.clone())?;
        let router = OsrmBackend::new(config.services.osrm_url.clone())?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            trips: TripCoordinator::new(store, chain),
            geocoder,
            router,
        })
    }

    pub fn chain(&self) -> &ChainAdapter {
        self.trips.chain()
    }
}
