//! Trip documents and the status state machine
//!
//! A trip moves forward only: `PENDING -> ACTIVE -> COMPLETED`. The allowed
//! pairs live in [`TRANSITIONS`]; anything not listed is rejected.

use crate::coord::Waypoint;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trip lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Pending,
    Active,
    Completed,
}

/// Every permitted `(from, to)` status pair
pub const TRANSITIONS: &[(TripStatus, TripStatus)] = &[
    (TripStatus::Pending, TripStatus::Active),
    (TripStatus::Active, TripStatus::Completed),
];

impl TripStatus {
    /// Ordinal used by the TripRegistry contract
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Active => 1,
            Self::Completed => 2,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            2 => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: TripStatus) -> bool {
        TRANSITIONS.contains(&(self, next))
    }

    /// Check a transition against the table
    pub fn check_transition(self, next: TripStatus) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl std::str::FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(format!("Unknown trip status: {}", s)),
        }
    }
}

/// Ledger bookkeeping for a mirrored trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// Hash of the `createTrip` transaction
    pub transaction_hash: String,

    /// Ledger-assigned trip id; `None` when the creation event could not be decoded
    pub on_chain_trip_id: Option<u64>,

    pub contract_address: Option<String>,

    /// Hash of the most recent `updateStatus` transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_transaction_hash: Option<String>,
}

/// A persisted trip document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub owner: String,
    pub start_location: Waypoint,
    pub destination: Waypoint,
    #[serde(default)]
    pub stops: Vec<Waypoint>,
    pub status: TripStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainMetadata>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// The ledger id, if this trip has been mirrored and the id is known
    pub fn on_chain_trip_id(&self) -> Option<u64> {
        self.chain.as_ref().and_then(|c| c.on_chain_trip_id)
    }

    /// Compact JSON summary recorded as the contract's `meta` string
    pub fn chain_summary(&self) -> String {
        let summary = serde_json::json!({
            "tripId": self.id,
            "owner": self.owner,
            "start": self.start_location,
            "destination": self.destination,
            "stops": self.stops.len(),
            "createdAt": self.created_at,
        });
        summary.to_string()
    }
}

/// Fields a caller supplies to create a trip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    #[serde(default)]
    pub owner: String,
    pub start_location: Option<Waypoint>,
    pub destination: Option<Waypoint>,
    #[serde(default)]
    pub stops: Vec<Waypoint>,
}

impl NewTrip {
    /// Validate and build a PENDING trip with a fresh id
    pub fn into_trip(self) -> Result<Trip> {
        let owner = self.owner.trim().to_string();
        if owner.is_empty() {
            return Err(Error::Validation("owner is required".to_string()));
        }

        let start_location = self
            .start_location
            .ok_or_else(|| Error::Validation("startLocation is required".to_string()))?;
        let destination = self
            .destination
            .ok_or_else(|| Error::Validation("destination is required".to_string()))?;

        start_location.validate("startLocation")?;
        destination.validate("destination")?;
        for stop in &self.stops {
            stop.validate("stop")?;
        }

        Ok(Trip {
            id: Uuid::new_v4().to_string(),
            owner,
            start_location,
            destination,
            stops: self.stops,
            status: TripStatus::Pending,
            chain: None,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_new_trip() -> NewTrip {
    use crate::coord::Coordinates;
    NewTrip {
        owner: "user-1".to_string(),
        start_location: Some(Waypoint::new("Berlin", Coordinates::new(52.52, 13.405))),
        destination: Some(Waypoint::new("Munich", Coordinates::new(48.1351, 11.582))),
        stops: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinates;

    #[test]
    fn test_transition_table() {
        use TripStatus::*;

        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));

        for (from, to) in [
            (Pending, Pending),
            (Active, Active),
            (Completed, Completed),
            (Active, Pending),
            (Completed, Active),
            (Completed, Pending),
            (Pending, Completed),
        ] {
            assert!(!from.can_transition_to(to), "{} -> {} allowed", from, to);
            assert!(matches!(
                from.check_transition(to),
                Err(Error::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_ordinals_round_trip() {
        for status in [TripStatus::Pending, TripStatus::Active, TripStatus::Completed] {
            assert_eq!(TripStatus::from_ordinal(status.ordinal()), Some(status));
        }
        assert_eq!(TripStatus::Active.ordinal(), 1);
        assert_eq!(TripStatus::from_ordinal(3), None);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TripStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert_eq!("active".parse::<TripStatus>(), Ok(TripStatus::Active));
        assert!("done".parse::<TripStatus>().is_err());
    }

    #[test]
    fn test_new_trip_validation() {
        let trip = sample_new_trip().into_trip().unwrap();
        assert_eq!(trip.status, TripStatus::Pending);
        assert!(trip.chain.is_none());
        assert!(trip.on_chain_trip_id().is_none());

        let mut missing_owner = sample_new_trip();
        missing_owner.owner = " ".to_string();
        assert!(matches!(missing_owner.into_trip(), Err(Error::Validation(_))));

        let mut missing_dest = sample_new_trip();
        missing_dest.destination = None;
        assert!(matches!(missing_dest.into_trip(), Err(Error::Validation(_))));

        let mut bad_coords = sample_new_trip();
        bad_coords.start_location = Some(Waypoint::new("Nowhere", Coordinates::new(123.0, 0.0)));
        assert!(matches!(bad_coords.into_trip(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_trip_serializes_camel_case() {
        let trip = sample_new_trip().into_trip().unwrap();
        let json = serde_json::to_value(&trip).unwrap();

        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["startLocation"]["coords"][0], 52.52);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("chain").is_none());
    }

    #[test]
    fn test_chain_summary() {
        let trip = sample_new_trip().into_trip().unwrap();
        let meta: serde_json::Value = serde_json::from_str(&trip.chain_summary()).unwrap();

        assert_eq!(meta["tripId"], trip.id.as_str());
        assert_eq!(meta["destination"]["name"], "Munich");
    }
}
