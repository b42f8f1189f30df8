//! trip-ledger: trip planning backend with on-chain trip mirroring
//!
//! A library and CLI tool that plans itineraries between two points, stores
//! trips, and mirrors trip creation and status changes onto a TripRegistry
//! smart contract.
//!
//! ## Features
//!
//! - Day-by-day itinerary generation by straight-line interpolation
//! - Trip documents with a forward-only status lifecycle
//! - Best-effort on-chain mirroring over JSON-RPC with locally signed transactions
//! - Geocoding (Nominatim) and driving routes (OSRM)
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use trip_ledger::coord::Coordinates;
//! use trip_ledger::itinerary;
//!
//! let berlin = Coordinates::new(52.52, 13.405);
//! let munich = Coordinates::new(48.1351, 11.582);
//!
//! // Three days gives five suggested stops
//! let plan = itinerary::plan(berlin, munich, 3, "castles");
//! assert_eq!(plan.itinerary.len(), 3);
//! assert_eq!(plan.stop_count(), 5);
//! println!("{}", plan.summary);
//! ```

pub mod chain;
pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod format;
pub mod geo;
pub mod itinerary;
pub mod lifecycle;
pub mod route;
pub mod server;
pub mod store;
pub mod trip;

// Re-export commonly used types
pub use chain::{ChainAdapter, LedgerClient};
pub use config::Config;
pub use coord::{Coordinates, Waypoint};
pub use error::{Error, Result};
pub use lifecycle::TripCoordinator;
pub use trip::{Trip, TripStatus};
