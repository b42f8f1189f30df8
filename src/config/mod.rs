//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/trip-ledger/config.toml
//!
//! The chain section can also be supplied through the `RPC_URL`, `PRIV_KEY`
//! and `CONTRACT_ADDR` environment variables, which win over the file.

pub mod defaults;

use crate::constants::api::{NOMINATIM_URL, OSRM_URL};
use crate::constants::contract::{TRIP_CREATED_EVENT, UPDATE_STATUS};
use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger connection settings
    #[serde(default)]
    pub chain: ChainConfig,

    /// Third-party map services
    #[serde(default)]
    pub services: ServicesConfig,

    /// Trip record storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Itinerary defaults
    #[serde(default)]
    pub itinerary: ItineraryConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Ledger connection settings
///
/// All of `rpc_url`, `private_key` and `contract_address` must be set for
/// chain mirroring to be enabled.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint
    #[serde(default)]
    pub rpc_url: String,

    /// Hex-encoded secp256k1 signing key
    #[serde(default)]
    pub private_key: String,

    /// Deployed TripRegistry address
    #[serde(default)]
    pub contract_address: String,

    /// Receipt wait limit in seconds
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Solidity signature of the status update function
    #[serde(default = "default_update_status_signature")]
    pub update_status_signature: String,

    /// Solidity signature of the event carrying the new trip id
    #[serde(default = "default_trip_created_event")]
    pub trip_created_event: String,
}

/// Fully-specified chain settings, only available when nothing is missing
#[derive(Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub private_key: String,
    pub contract_address: String,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub update_status_signature: String,
    pub trip_created_event: String,
}

fn masked(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &masked(&self.private_key))
            .field("contract_address", &self.contract_address)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("update_status_signature", &self.update_status_signature)
            .field("trip_created_event", &self.trip_created_event)
            .finish()
    }
}

impl std::fmt::Debug for ChainSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSettings")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &masked(&self.private_key))
            .field("contract_address", &self.contract_address)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("update_status_signature", &self.update_status_signature)
            .field("trip_created_event", &self.trip_created_event)
            .finish()
    }
}

/// Third-party map services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Nominatim base URL
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    /// OSRM base URL
    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,
}

/// Trip record storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the trips file (defaults to the XDG data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trips_file: Option<PathBuf>,
}

/// Itinerary defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryConfig {
    /// Default CLI output format
    #[serde(default = "default_itinerary_format")]
    pub format: String,
}

// Default value functions for serde
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_confirmation_timeout() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_update_status_signature() -> String {
    UPDATE_STATUS.to_string()
}
fn default_trip_created_event() -> String {
    TRIP_CREATED_EVENT.to_string()
}
fn default_nominatim_url() -> String {
    NOMINATIM_URL.to_string()
}
fn default_osrm_url() -> String {
    OSRM_URL.to_string()
}
fn default_itinerary_format() -> String {
    DEFAULT_ITINERARY_FORMAT.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            private_key: String::new(),
            contract_address: String::new(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            poll_interval_ms: default_poll_interval(),
            update_status_signature: default_update_status_signature(),
            trip_created_event: default_trip_created_event(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            osrm_url: default_osrm_url(),
        }
    }
}

impl Default for ItineraryConfig {
    fn default() -> Self {
        Self {
            format: default_itinerary_format(),
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    let chosen = if value.is_empty() { default } else { value };
    chosen.to_string()
}

impl ChainConfig {
    /// Resolve complete settings, or `None` when any required value is absent
    pub fn settings(&self) -> Option<ChainSettings> {
        let present = |s: &str| !s.trim().is_empty();
        if !present(&self.rpc_url) || !present(&self.private_key) || !present(&self.contract_address)
        {
            return None;
        }

        Some(ChainSettings {
            rpc_url: self.rpc_url.trim().to_string(),
            private_key: self.private_key.trim().to_string(),
            contract_address: self.contract_address.trim().to_string(),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            update_status_signature: or_default(&self.update_status_signature, UPDATE_STATUS),
            trip_created_event: or_default(&self.trip_created_event, TRIP_CREATED_EVENT),
        })
    }
}

/// Accept `name(type,...)` with no spaces, the form keccak selectors are taken over
fn checked_signature(value: &str) -> Result<String> {
    let value = value.trim();
    let well_formed = value
        .split_once('(')
        .is_some_and(|(name, _)| !name.is_empty())
        && value.ends_with(')')
        && !value.contains(char::is_whitespace);
    if !well_formed {
        return Err(Error::Config(format!("Invalid Solidity signature: {}", value)));
    }
    Ok(value.to_string())
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path, then apply environment overrides
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config = Self::load_from(Self::config_path()?)?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Load configuration from a specific path, creating it with defaults if missing
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Overlay chain values from the environment
    ///
    /// `lookup` is usually `std::env::var`; empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_RPC_URL) {
            self.chain.rpc_url = v;
        }
        if let Some(v) = get(ENV_PRIVATE_KEY) {
            self.chain.private_key = v;
        }
        if let Some(v) = get(ENV_CONTRACT_ADDR) {
            self.chain.contract_address = v;
        }
        self
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            ["chain", "rpc_url"] => Some(self.chain.rpc_url.clone()),
            ["chain", "private_key"] => Some(self.chain.private_key.clone()),
            ["chain", "contract_address"] => Some(self.chain.contract_address.clone()),
            ["chain", "confirmation_timeout_secs"] => {
                Some(self.chain.confirmation_timeout_secs.to_string())
            }
            ["chain", "poll_interval_ms"] => Some(self.chain.poll_interval_ms.to_string()),
            ["chain", "update_status_signature"] => {
                Some(self.chain.update_status_signature.clone())
            }
            ["chain", "trip_created_event"] => Some(self.chain.trip_created_event.clone()),

            ["services", "nominatim_url"] => Some(self.services.nominatim_url.clone()),
            ["services", "osrm_url"] => Some(self.services.osrm_url.clone()),

            ["storage", "trips_file"] => Some(
                self.storage
                    .trips_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),

            ["itinerary", "format"] => Some(self.itinerary.format.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid port value: {}", value)))?;
            }

            ["chain", "rpc_url"] => {
                self.chain.rpc_url = value.to_string();
            }
            ["chain", "private_key"] => {
                self.chain.private_key = value.to_string();
            }
            ["chain", "contract_address"] => {
                self.chain.contract_address = value.to_string();
            }
            ["chain", "confirmation_timeout_secs"] => {
                self.chain.confirmation_timeout_secs = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid timeout value: {}", value)))?;
            }
            ["chain", "poll_interval_ms"] => {
                self.chain.poll_interval_ms = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid interval value: {}", value)))?;
            }
            ["chain", "update_status_signature"] => {
                self.chain.update_status_signature = checked_signature(value)?;
            }
            ["chain", "trip_created_event"] => {
                self.chain.trip_created_event = checked_signature(value)?;
            }

            ["services", "nominatim_url"] => {
                self.services.nominatim_url = value.to_string();
            }
            ["services", "osrm_url"] => {
                self.services.osrm_url = value.to_string();
            }

            ["storage", "trips_file"] => {
                self.storage.trips_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            ["itinerary", "format"] => {
                if crate::format::get_formatter(value).is_none() {
                    return Err(Error::Config(format!("Unknown format: {}", value)));
                }
                self.itinerary.format = value.to_string();
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "server.host",
            "server.port",
            "chain.rpc_url",
            "chain.private_key",
            "chain.contract_address",
            "chain.confirmation_timeout_secs",
            "chain.poll_interval_ms",
            "chain.update_status_signature",
            "chain.trip_created_event",
            "services.nominatim_url",
            "services.osrm_url",
            "storage.trips_file",
            "itinerary.format",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
