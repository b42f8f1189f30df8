//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod chain;
pub mod config;
pub mod itinerary;
pub mod serve;
pub mod status;
pub mod trips;

use crate::coord::{Coordinates, Waypoint};
use crate::error::{Error, Result};
use crate::geo::GeoBackend;
use clap::{Parser, Subcommand};

/// Trip planning backend with on-chain trip mirroring
#[derive(Parser)]
#[command(name = "trip-ledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Generate a day-by-day itinerary
    Itinerary(itinerary::ItineraryArgs),

    /// Create, inspect and advance trips
    Trips(trips::TripsArgs),

    /// Query the trip registry contract
    Chain(chain::ChainArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Show server, storage and chain status
    Status(status::StatusArgs),
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Itinerary(args) => itinerary::run(args).await,
        Commands::Trips(args) => trips::run(args).await,
        Commands::Chain(args) => chain::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Status(args) => status::run(args).await,
    }
}

/// Parse a literal `lat,lng` pair
pub fn parse_coords(input: &str) -> Option<Coordinates> {
    let (lat, lng) = input.split_once(',')?;
    let lat = lat.trim().parse().ok()?;
    let lng = lng.trim().parse().ok()?;
    Some(Coordinates::new(lat, lng))
}

/// Resolve a place given as `lat,lng` or as a name to geocode
pub async fn resolve_place<G: GeoBackend>(geocoder: &G, input: &str) -> Result<Waypoint> {
    if let Some(coords) = parse_coords(input) {
        coords.validate()?;
        return Ok(Waypoint::new(input.trim(), coords));
    }

    match geocoder.geocode(input).await? {
        Some(location) => {
            eprintln!("Geocoded '{}' to: {}", input, location.display_name);
            Ok(location.into_waypoint())
        }
        None => Err(Error::Geocoding(format!("Could not geocode '{}'", input))),
    }
}
