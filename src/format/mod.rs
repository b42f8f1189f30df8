//! Output formatters
//!
//! Trait-based output formatting for generated itineraries.

pub mod gpx;
pub mod json;
pub mod text;

use crate::error::Result;
use crate::itinerary::Itinerary;
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format the itinerary
    fn format(&self, itinerary: &Itinerary) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        "gpx" => Some(Box::new(gpx::GpxFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    ["json", "text", "gpx"]
        .into_iter()
        .filter_map(get_formatter)
        .map(|f| FormatInfo {
            name: f.name().to_string(),
            description: f.description().to_string(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn sample_itinerary() -> Itinerary {
    use crate::coord::Coordinates;
    crate::itinerary::plan(
        Coordinates::new(48.8566, 2.3522),
        Coordinates::new(43.2965, 5.3698),
        2,
        "wine",
    )
}
