//! GPX output formatter

use crate::error::Result;
use crate::format::OutputFormatter;
use crate::itinerary::Itinerary;

/// GPX formatter - one waypoint per suggested stop
pub struct GpxFormatter;

impl OutputFormatter for GpxFormatter {
    fn name(&self) -> &str {
        "gpx"
    }

    fn description(&self) -> &str {
        "GPX waypoint file"
    }

    fn format(&self, itinerary: &Itinerary) -> Result<String> {
        let mut gpx = String::new();

        gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        gpx.push('\n');
        gpx.push_str(r#"<gpx version="1.1" creator="trip-ledger">"#);
        gpx.push('\n');

        gpx.push_str("  <metadata>\n");
        gpx.push_str(&format!("    <desc>{}</desc>\n", escape(&itinerary.summary)));
        gpx.push_str("  </metadata>\n");

        for plan in &itinerary.itinerary {
            for stop in &plan.stops {
                gpx.push_str(&format!(
                    r#"  <wpt lat="{}" lon="{}">"#,
                    stop.coords.lat, stop.coords.lng
                ));
                gpx.push('\n');
                gpx.push_str(&format!("    <name>{}</name>\n", escape(&stop.name)));
                gpx.push_str(&format!("    <desc>{}</desc>\n", escape(&stop.note)));
                gpx.push_str(&format!("    <type>day {}</type>\n", plan.day));
                gpx.push_str("  </wpt>\n");
            }
        }

        gpx.push_str("</gpx>\n");
        Ok(gpx)
    }
}

/// Escape text for XML element content
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
