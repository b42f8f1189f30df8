//! trip-ledger CLI entry point
//!
//! Trip planning backend - CLI + HTTP API

use trip_ledger::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
