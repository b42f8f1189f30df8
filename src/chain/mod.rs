//! TripRegistry chain adapter
//!
//! [`ChainAdapter`] is the only component that holds the signing key or
//! writes to the ledger. It starts not-ready and connects on first use; when
//! the chain settings are incomplete it stays uninitialized and every call
//! fails fast with [`Error::ChainUninitialized`] without touching the network.
//!
//! The ledger itself sits behind [`LedgerClient`], so tests can swap the
//! JSON-RPC client for an in-process fake.

pub mod abi;
pub mod events;
pub mod registry;
pub mod rlp;
pub mod rpc;
pub mod signer;

#[cfg(test)]
pub(crate) mod fake;

use crate::config::ChainSettings;
use crate::error::{Error, Result};
use crate::trip::TripStatus;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::warn;

pub use registry::RpcLedger;

/// A trip as recorded by the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainTrip {
    pub creator: String,
    pub meta: String,
    pub status: TripStatus,
}

impl ChainTrip {
    pub fn from_raw(raw: abi::RawTrip) -> Result<Self> {
        let status = TripStatus::from_ordinal(raw.status).ok_or_else(|| {
            Error::ChainUnavailable(format!("Unknown on-chain status {}", raw.status))
        })?;
        Ok(Self {
            creator: format!("0x{}", hex::encode(raw.creator)),
            meta: raw.meta,
            status,
        })
    }
}

/// Result of a confirmed `createTrip` transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTrip {
    pub transaction_hash: String,

    /// `None` when the receipt carried no decodable `TripCreated` event
    pub on_chain_trip_id: Option<u64>,
}

/// Operations exposed by the TripRegistry contract
///
/// Writes return once the transaction has one confirmation.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    fn contract_address(&self) -> String;

    async fn create_trip(&self, meta: &str) -> Result<CreatedTrip>;

    /// Returns the hash of the confirmed `updateStatus` transaction
    async fn update_status(&self, trip_id: u64, status: TripStatus) -> Result<String>;

    async fn get_trip(&self, trip_id: u64) -> Result<ChainTrip>;

    async fn total_trips(&self) -> Result<u64>;
}

/// Snapshot reported by the status endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_trips: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lazily connected handle on the ledger
pub struct ChainAdapter {
    settings: Option<ChainSettings>,
    client: OnceCell<Arc<dyn LedgerClient>>,
}

impl std::fmt::Debug for ChainAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAdapter")
            .field("configured", &self.is_configured())
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl ChainAdapter {
    /// Adapter that connects with `settings` on first use
    pub fn from_settings(settings: Option<ChainSettings>) -> Self {
        if settings.is_none() {
            warn!("chain settings incomplete; trips will not be mirrored on-chain");
        }
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    /// Adapter that is ready immediately with the given client
    pub fn with_client(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            settings: None,
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// Whether the adapter can ever become ready
    pub fn is_configured(&self) -> bool {
        self.settings.is_some() || self.client.initialized()
    }

    /// Whether a ledger client has been established
    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }

    /// Configured contract address, if any
    pub fn contract_address(&self) -> Option<String> {
        match self.client.get() {
            Some(client) => Some(client.contract_address()),
            None => self.settings.as_ref().map(|s| s.contract_address.clone()),
        }
    }

    /// Get the ledger client, connecting on first use
    ///
    /// A failed connection leaves the adapter not-ready so a later call can
    /// try again.
    async fn client(&self) -> Result<&Arc<dyn LedgerClient>> {
        let Some(settings) = &self.settings else {
            return self.client.get().ok_or(Error::ChainUninitialized);
        };

        self.client
            .get_or_try_init(|| async {
                match RpcLedger::connect(settings).await {
                    Ok(ledger) => Ok(Arc::new(ledger) as Arc<dyn LedgerClient>),
                    Err(Error::Config(reason)) => {
                        warn!(%reason, "chain settings rejected");
                        Err(Error::ChainUninitialized)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }

    pub async fn create_trip(&self, meta: &str) -> Result<CreatedTrip> {
        self.client().await?.create_trip(meta).await
    }

    pub async fn update_status(&self, trip_id: u64, status: TripStatus) -> Result<String> {
        self.client().await?.update_status(trip_id, status).await
    }

    pub async fn get_trip(&self, trip_id: u64) -> Result<ChainTrip> {
        self.client().await?.get_trip(trip_id).await
    }

    pub async fn total_trips(&self) -> Result<u64> {
        self.client().await?.total_trips().await
    }

    /// Connect if needed and report readiness with the current trip count
    pub async fn status(&self) -> ChainStatus {
        match self.total_trips().await {
            Ok(total) => ChainStatus {
                initialized: true,
                contract: self.contract_address(),
                total_trips: Some(total),
                error: None,
            },
            Err(e) => ChainStatus {
                initialized: self.is_ready(),
                contract: self.contract_address(),
                total_trips: None,
                error: Some(e.to_string()),
            },
        }
    }
}
