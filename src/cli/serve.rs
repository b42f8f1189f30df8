//! Serve command handler
//!
//! Opens the trip store, optionally checks the ledger, then runs the HTTP API
//! in the foreground.

use crate::config::Config;
use crate::error::Result;
use crate::server::{self, state::AppState};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Serve command arguments
#[derive(Args, Default)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Trips file to use instead of the configured one
    #[arg(long, value_name = "PATH")]
    pub trips_file: Option<PathBuf>,

    /// Save trips without mirroring them, even when the chain is configured
    #[arg(long, conflicts_with = "check_chain")]
    pub no_chain: bool,

    /// Connect to the ledger before accepting requests and report its state
    #[arg(long)]
    pub check_chain: bool,
}

impl ServeArgs {
    /// Overlay command-line overrides onto the loaded config
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.trips_file {
            config.storage.trips_file = Some(path.clone());
        }
        if self.no_chain {
            // An empty endpoint leaves the chain settings incomplete
            config.chain.rpc_url.clear();
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::load()?;
    args.apply(&mut config);
    let addr = server::parse_addr(&config.server_addr())?;

    let state = Arc::new(AppState::new(config).await?);

    if args.check_chain {
        let status = state.chain().status().await;
        if status.initialized {
            info!(
                contract = ?status.contract,
                total_trips = ?status.total_trips,
                "ledger reachable"
            );
        } else {
            warn!(error = ?status.error, "ledger not ready; trips will be saved without mirroring");
        }
    }

    let trips = state.trips.list(None).await?;
    let mirrored = trips.iter().filter(|t| t.chain.is_some()).count();
    info!(
        %addr,
        trips = trips.len(),
        mirrored,
        chain_configured = state.chain().is_configured(),
        "Starting trip-ledger server v{}",
        env!("CARGO_PKG_VERSION")
    );

    server::serve(addr, state).await
}
