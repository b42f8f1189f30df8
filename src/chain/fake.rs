//! In-process ledger used by tests

use crate::chain::{ChainTrip, CreatedTrip, LedgerClient};
use crate::error::{Error, Result};
use crate::trip::TripStatus;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const FAKE_CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const FAKE_CREATOR: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// How the next write should fail
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Unavailable,
    Rejected(String),
}

impl Failure {
    fn to_error(&self) -> Error {
        match self {
            Failure::Unavailable => Error::ChainUnavailable("connection refused".to_string()),
            Failure::Rejected(reason) => Error::ChainRejected(reason.clone()),
        }
    }
}

/// Mimics the TripRegistry contract, including its forward-only status check
#[derive(Debug, Default)]
pub(crate) struct FakeLedger {
    trips: Mutex<Vec<ChainTrip>>,
    failure: Mutex<Option<Failure>>,
    omit_event: bool,
    delay: Duration,
    creates: AtomicUsize,
    updates: AtomicUsize,
    tx_counter: AtomicUsize,
}

impl FakeLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Receipts carry no `TripCreated` event
    pub(crate) fn without_events() -> Self {
        Self {
            omit_event: true,
            ..Self::default()
        }
    }

    /// Every write sleeps before confirming
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub(crate) fn fail_with(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn next_hash(&self) -> String {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("0x{:064x}", n)
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    fn contract_address(&self) -> String {
        FAKE_CONTRACT.to_string()
    }

    async fn create_trip(&self, meta: &str) -> Result<CreatedTrip> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.check_failure()?;

        let id = {
            let mut trips = self.trips.lock().unwrap();
            trips.push(ChainTrip {
                creator: FAKE_CREATOR.to_string(),
                meta: meta.to_string(),
                status: TripStatus::Pending,
            });
            (trips.len() - 1) as u64
        };

        Ok(CreatedTrip {
            transaction_hash: self.next_hash(),
            on_chain_trip_id: if self.omit_event { None } else { Some(id) },
        })
    }

    async fn update_status(&self, trip_id: u64, status: TripStatus) -> Result<String> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.check_failure()?;

        let mut trips = self.trips.lock().unwrap();
        let trip = trips
            .get_mut(trip_id as usize)
            .ok_or_else(|| Error::ChainRejected("Trip does not exist".to_string()))?;
        if status.ordinal() <= trip.status.ordinal() {
            return Err(Error::ChainRejected("Status can only move forward".to_string()));
        }
        trip.status = status;
        drop(trips);

        Ok(self.next_hash())
    }

    async fn get_trip(&self, trip_id: u64) -> Result<ChainTrip> {
        self.trips
            .lock()
            .unwrap()
            .get(trip_id as usize)
            .cloned()
            .ok_or_else(|| Error::ChainRejected("Trip does not exist".to_string()))
    }

    async fn total_trips(&self) -> Result<u64> {
        Ok(self.trips.lock().unwrap().len() as u64)
    }
}
