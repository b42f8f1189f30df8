//! Itinerary command handler
//!
//! Plans suggested stops between two places and optionally looks up the
//! driving route between them.

use crate::cli::resolve_place;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{available_formats, get_formatter};
use crate::geo::nominatim::NominatimBackend;
use crate::itinerary::{self, Endpoint, ItineraryRequest};
use crate::route::osrm::OsrmBackend;
use crate::route::RouteBackend;
use clap::Args;

/// Itinerary command arguments
#[derive(Args)]
pub struct ItineraryArgs {
    /// Start place: "lat,lng" or a name to geocode
    #[arg(long, short = 's', required_unless_present = "list_formats")]
    pub start: Option<String>,

    /// Destination place: "lat,lng" or a name to geocode
    #[arg(long, short = 'd', required_unless_present = "list_formats")]
    pub destination: Option<String>,

    /// Number of days (1-7)
    #[arg(long, short = 'n', default_value = "1")]
    pub days: String,

    /// Free-text preferences noted on each stop
    #[arg(long, short = 'p')]
    pub preferences: Option<String>,

    /// Output format
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Also fetch the driving route between start and destination
    #[arg(long)]
    pub route: bool,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

/// Run the itinerary command
pub async fn run(args: ItineraryArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    let config = Config::load()?;
    let geocoder = NominatimBackend::new(config.services.nominatim_url.clone())?;

    let (Some(start), Some(destination)) = (&args.start, &args.destination) else {
        return Err(Error::Validation(itinerary::MISSING_COORDS.to_string()));
    };
    let start = resolve_place(&geocoder, start).await?;
    let destination = resolve_place(&geocoder, destination).await?;

    let request = ItineraryRequest {
        start: Some(Endpoint::at(start.coords)),
        destination: Some(Endpoint::at(destination.coords)),
        days: Some(serde_json::Value::String(args.days.clone())),
        preferences: args.preferences.clone(),
    };
    let plan = itinerary::generate(&request)?;

    let format = args.format.unwrap_or(config.itinerary.format.clone());
    let formatter = get_formatter(&format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", format)))?;
    let output = formatter.format(&plan)?;

    if let Some(path) = args.output {
        std::fs::write(&path, &output)?;
        eprintln!("Output written to {}", path);
    } else {
        println!("{}", output);
    }

    if args.route {
        let router = OsrmBackend::new(config.services.osrm_url.clone())?;
        match router.route(&[start.coords, destination.coords]).await? {
            Some(route) => eprintln!(
                "Driving route: {} ({})",
                route.distance_label(),
                route.duration_label()
            ),
            None => eprintln!("No driving route found"),
        }
    }

    Ok(())
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:<6} - {}", format.name, format.description);
    }
}
