//! Error types for trip-ledger

use thiserror::Error;

/// Main error type for trip-ledger operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing request fields
    #[error("{0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The trip was never mirrored on-chain, so there is no ledger entry to update
    #[error("Trip {0} has no on-chain trip id")]
    NotMirrored(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Blockchain not initialized")]
    ChainUninitialized,

    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),

    /// The ledger reverted the transaction; carries the revert reason when known
    #[error("Chain rejected transaction: {0}")]
    ChainRejected(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for trip-ledger operations
pub type Result<T> = std::result::Result<T, Error>;
