//! Status command handler
//!
//! Shows server, trip store and chain status.

use crate::chain::ChainAdapter;
use crate::cli::chain::print_status;
use crate::config::Config;
use crate::error::Result;
use crate::store::{JsonTripStore, TripStore};
use clap::Args;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Check if server is running (tries to connect)
    #[arg(long)]
    pub server: bool,

    /// Skip contacting the chain
    #[arg(long)]
    pub offline: bool,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> Result<()> {
    let config = Config::load()?;

    // Check server status if requested
    if args.server {
        check_server_status(&config).await;
    }

    println!("trip-ledger v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let path = JsonTripStore::configured_path(&config.storage)?;
    let store = JsonTripStore::open(path.clone()).await?;
    let trips = store.list(None).await?;
    let mirrored = trips.iter().filter(|t| t.chain.is_some()).count();
    println!("Trip store: {}", path.display());
    println!("  Trips: {} ({} mirrored on-chain)", trips.len(), mirrored);
    println!();

    if args.offline {
        let configured = config.chain.settings().is_some();
        println!(
            "Chain: {}",
            if configured { "CONFIGURED" } else { "NOT CONFIGURED" }
        );
    } else {
        print_status(&ChainAdapter::from_settings(config.chain.settings())).await;
    }

    Ok(())
}

/// Check if the server is running
async fn check_server_status(config: &Config) {
    let url = format!("http://{}/api/status", config.server_addr());

    match reqwest::get(&url).await {
        Ok(response) => {
            if response.status().is_success() {
                println!("Server: RUNNING on {}", config.server_addr());
                if let Ok(status) = response.json::<serde_json::Value>().await {
                    if let Some(version) = status.get("version").and_then(|v| v.as_str()) {
                        println!("  Version: {}", version);
                    }
                    if let Some(ready) = status.pointer("/chain/initialized").and_then(|v| v.as_bool()) {
                        println!("  Chain ready: {}", ready);
                    }
                }
            } else {
                println!("Server: ERROR (status {})", response.status());
            }
        }
        Err(_) => {
            println!("Server: NOT RUNNING on {}", config.server_addr());
        }
    }
    println!();
}
