//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5000;

/// How long to wait for a transaction receipt before giving up
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// Receipt polling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default itinerary output format for the CLI
pub const DEFAULT_ITINERARY_FORMAT: &str = "text";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "trip-ledger";

/// Environment variable overriding `chain.rpc_url`
pub const ENV_RPC_URL: &str = "RPC_URL";

/// Environment variable overriding `chain.private_key`
pub const ENV_PRIVATE_KEY: &str = "PRIV_KEY";

/// Environment variable overriding `chain.contract_address`
pub const ENV_CONTRACT_ADDR: &str = "CONTRACT_ADDR";
