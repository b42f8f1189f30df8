//! Trips command handler
//!
//! Works directly against the configured trip store and chain, the same way
//! the server does.

use crate::cli::resolve_place;
use crate::config::Config;
use crate::error::Result;
use crate::server::state::AppState;
use crate::trip::{NewTrip, Trip, TripStatus};
use clap::{Args, Subcommand};

/// Trips command arguments
#[derive(Args)]
pub struct TripsArgs {
    #[command(subcommand)]
    pub command: Option<TripsCommand>,
}

/// Trips subcommands
#[derive(Subcommand)]
pub enum TripsCommand {
    /// List trips, newest first
    List {
        /// Only trips created by this owner
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show a trip as JSON
    Show {
        /// Trip ID
        id: String,
    },
    /// Create a trip and mirror it on-chain
    Create {
        /// Owner reference
        #[arg(long)]
        owner: String,
        /// Start place: "lat,lng" or a name to geocode
        #[arg(long)]
        start: String,
        /// Destination place: "lat,lng" or a name to geocode
        #[arg(long)]
        destination: String,
        /// Intermediate stop (repeatable, in travel order)
        #[arg(long = "stop")]
        stops: Vec<String>,
    },
    /// Advance a trip's status (PENDING -> ACTIVE -> COMPLETED)
    Status {
        /// Trip ID
        id: String,
        /// Target status
        status: TripStatus,
    },
    /// Append a stop to a PENDING trip
    AddStop {
        /// Trip ID
        id: String,
        /// Place: "lat,lng" or a name to geocode
        place: String,
    },
}

/// Run the trips command
pub async fn run(args: TripsArgs) -> Result<()> {
    let command = args.command.unwrap_or(TripsCommand::List { owner: None });
    let state = AppState::new(Config::load()?).await?;

    match command {
        TripsCommand::List { owner } => list_trips(&state, owner.as_deref()).await,
        TripsCommand::Show { id } => {
            let trip = state.trips.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&trip)?);
            Ok(())
        }
        TripsCommand::Create {
            owner,
            start,
            destination,
            stops,
        } => create_trip(&state, owner, &start, &destination, &stops).await,
        TripsCommand::Status { id, status } => {
            let trip = state.trips.transition(&id, status).await?;
            println!("{} is now {}", trip.id, trip.status);
            if let Some(hash) = trip.chain.and_then(|c| c.status_transaction_hash) {
                println!("  Transaction: {}", hash);
            }
            Ok(())
        }
        TripsCommand::AddStop { id, place } => {
            let stop = resolve_place(&state.geocoder, &place).await?;
            let trip = state.trips.append_stop(&id, stop).await?;
            println!("{} now has {} stop(s)", trip.id, trip.stops.len());
            Ok(())
        }
    }
}

async fn list_trips(state: &AppState, owner: Option<&str>) -> Result<()> {
    let trips = state.trips.list(owner).await?;
    if trips.is_empty() {
        println!("No trips.");
        return Ok(());
    }

    println!("Trips ({}):\n", trips.len());
    for trip in &trips {
        println!("{}\n", describe(trip));
    }
    Ok(())
}

async fn create_trip(
    state: &AppState,
    owner: String,
    start: &str,
    destination: &str,
    stops: &[String],
) -> Result<()> {
    let start_location = resolve_place(&state.geocoder, start).await?;
    let destination = resolve_place(&state.geocoder, destination).await?;
    let mut waypoints = Vec::with_capacity(stops.len());
    for stop in stops {
        waypoints.push(resolve_place(&state.geocoder, stop).await?);
    }

    let outcome = state
        .trips
        .create_trip(NewTrip {
            owner,
            start_location: Some(start_location),
            destination: Some(destination),
            stops: waypoints,
        })
        .await?;

    println!("Created trip:\n\n{}", describe(&outcome.trip));
    if let Some(e) = &outcome.mirror_error {
        eprintln!("\nWarning: trip saved but not mirrored on-chain: {}", e);
    }
    Ok(())
}

/// One-paragraph summary of a trip
fn describe(trip: &Trip) -> String {
    let chain = match &trip.chain {
        Some(c) => match c.on_chain_trip_id {
            Some(id) => format!("on-chain #{} ({})", id, c.transaction_hash),
            None => format!("on-chain id unknown ({})", c.transaction_hash),
        },
        None => "not mirrored".to_string(),
    };

    format!(
        "  {} [{}] owner {}\n    {} -> {} | {} stop(s)\n    {} | created {}",
        trip.id,
        trip.status,
        trip.owner,
        trip.start_location.name,
        trip.destination.name,
        trip.stops.len(),
        chain,
        trip.created_at.format("%Y-%m-%d %H:%M UTC"),
    )
}
