//! Chain command handler
//!
//! Read-only queries against the trip registry contract.

use crate::chain::ChainAdapter;
use crate::config::Config;
use crate::error::Result;
use clap::{Args, Subcommand};

/// Chain command arguments
#[derive(Args)]
pub struct ChainArgs {
    #[command(subcommand)]
    pub command: Option<ChainCommand>,
}

/// Chain subcommands
#[derive(Subcommand)]
pub enum ChainCommand {
    /// Show connection state and trip count
    Status,
    /// Show a trip as recorded on-chain
    Trip {
        /// On-chain trip id
        id: u64,
    },
}

/// Run the chain command
pub async fn run(args: ChainArgs) -> Result<()> {
    let config = Config::load()?;
    let adapter = ChainAdapter::from_settings(config.chain.settings());

    match args.command.unwrap_or(ChainCommand::Status) {
        ChainCommand::Status => {
            print_status(&adapter).await;
            Ok(())
        }
        ChainCommand::Trip { id } => {
            let trip = adapter.get_trip(id).await?;
            println!("Trip #{}", id);
            println!("  Creator: {}", trip.creator);
            println!("  Status:  {}", trip.status);
            println!("  Meta:    {}", trip.meta);
            Ok(())
        }
    }
}

/// Print chain readiness, shared with the status command
pub async fn print_status(adapter: &ChainAdapter) {
    if !adapter.is_configured() {
        println!("Chain: NOT CONFIGURED (set RPC_URL, PRIV_KEY and CONTRACT_ADDR)");
        return;
    }

    let status = adapter.status().await;
    match (status.initialized, status.total_trips) {
        (true, Some(total)) => {
            println!("Chain: CONNECTED");
            println!("  Total trips: {}", total);
        }
        _ => println!("Chain: UNAVAILABLE"),
    }
    if let Some(contract) = &status.contract {
        println!("  Contract: {}", contract);
    }
    if let Some(error) = &status.error {
        println!("  Error: {}", error);
    }
}
