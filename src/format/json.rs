//! JSON output formatter

use crate::error::Result;
use crate::format::OutputFormatter;
use crate::itinerary::Itinerary;

/// JSON formatter - same body the HTTP API returns
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Full JSON response"
    }

    fn format(&self, itinerary: &Itinerary) -> Result<String> {
        Ok(serde_json::to_string_pretty(itinerary)?)
    }
}
