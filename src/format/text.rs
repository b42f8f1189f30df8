//! Human-readable text output formatter

use crate::coord::point::path_length;
use crate::coord::Coordinates;
use crate::error::Result;
use crate::format::OutputFormatter;
use crate::itinerary::Itinerary;

/// Text formatter - outputs a day-by-day summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, itinerary: &Itinerary) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("{}\n", itinerary.summary));

        let points: Vec<Coordinates> = itinerary.stops().map(|s| s.coords).collect();
        output.push_str(&format!(
            "Distance across stops (straight line): {:.1} km\n",
            path_length(&points) / 1000.0
        ));

        for plan in &itinerary.itinerary {
            output.push_str(&format!("\nDay {}:\n", plan.day));
            if plan.stops.is_empty() {
                output.push_str("  (rest day)\n");
            }
            for stop in &plan.stops {
                output.push_str(&format!(
                    "  {} ({:.6}, {:.6})\n    {}\n",
                    stop.name, stop.coords.lat, stop.coords.lng, stop.note
                ));
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::sample_itinerary;

    #[test]
    fn test_text_format() {
        let output = TextFormatter.format(&sample_itinerary()).unwrap();

        assert!(output.contains("Generated 2 day(s)"));
        assert!(output.contains("Day 1:"));
        assert!(output.contains("Day 2:"));
        assert!(output.contains("Suggested stop 3"));
        assert!(output.contains("wine"));
        assert!(output.contains(" km"));
    }

    #[test]
    fn test_text_formatter_info() {
        assert_eq!(TextFormatter.name(), "text");
        assert!(!TextFormatter.description().is_empty());
    }
}
