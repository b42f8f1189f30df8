//! Itinerary generation
//!
//! Builds a day-by-day list of suggested stops between a start point and a
//! destination. Stops are placed by straight linear interpolation, roughly two
//! per day, then split into contiguous day buckets. Nothing here touches the
//! network; the driving path is resolved separately by the route client.

use crate::constants::itinerary::{GENERAL_PREFERENCES, MAX_DAYS, MIN_DAYS};
use crate::coord::point::interpolate;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message returned when either endpoint lacks coordinates
pub const MISSING_COORDS: &str = "start and destination with coords required";

/// A loosely-typed endpoint as received from clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinates>,
}

impl Endpoint {
    pub fn at(coords: Coordinates) -> Self {
        Self {
            name: None,
            coords: Some(coords),
        }
    }
}

/// Itinerary request body
///
/// `days` stays untyped: clients send numbers, numeric strings, or nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItineraryRequest {
    #[serde(default)]
    pub start: Option<Endpoint>,
    #[serde(default)]
    pub destination: Option<Endpoint>,
    #[serde(default)]
    pub days: Option<Value>,
    #[serde(default)]
    pub preferences: Option<String>,
}

/// A single suggested stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedStop {
    pub name: String,
    pub coords: Coordinates,
    pub note: String,
}

/// Stops planned for one day (1-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: usize,
    pub stops: Vec<SuggestedStop>,
}

/// Generated itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub itinerary: Vec<DayPlan>,
    pub summary: String,
}

impl Itinerary {
    /// All stops in travel order
    pub fn stops(&self) -> impl Iterator<Item = &SuggestedStop> {
        self.itinerary.iter().flat_map(|d| d.stops.iter())
    }

    pub fn stop_count(&self) -> usize {
        self.itinerary.iter().map(|d| d.stops.len()).sum()
    }
}

/// Generate an itinerary from a raw request
pub fn generate(req: &ItineraryRequest) -> Result<Itinerary> {
    let start = req.start.as_ref().and_then(|e| e.coords);
    let destination = req.destination.as_ref().and_then(|e| e.coords);

    let (start, destination) = match (start, destination) {
        (Some(s), Some(d)) => (s, d),
        _ => return Err(Error::Validation(MISSING_COORDS.to_string())),
    };

    let days = parse_days(req.days.as_ref());
    let preferences = req.preferences.as_deref().unwrap_or("");

    Ok(plan(start, destination, days, preferences))
}

/// Plan `days` days of stops between two points
///
/// `days` must already be clamped to `[1, 7]`.
pub fn plan(start: Coordinates, destination: Coordinates, days: usize, preferences: &str) -> Itinerary {
    let days = days.max(1);
    let total_stops = (days * 2).saturating_sub(1).max(1);
    let label = if preferences.is_empty() {
        GENERAL_PREFERENCES
    } else {
        preferences
    };

    let stops: Vec<SuggestedStop> = (1..=total_stops)
        .map(|i| {
            let t = i as f64 / (total_stops + 1) as f64;
            SuggestedStop {
                name: format!("Suggested stop {}", i),
                coords: interpolate(start, destination, t),
                note: format!("Stop {} - based on preferences: {}", i, label),
            }
        })
        .collect();

    let per_day = total_stops.div_ceil(days);
    let mut remaining = stops.into_iter();
    let itinerary: Vec<DayPlan> = (1..=days)
        .map(|day| DayPlan {
            day,
            stops: remaining.by_ref().take(per_day).collect(),
        })
        .collect();

    let summary = format!(
        "Generated {} day(s) itinerary with {} stops based on preferences: {}",
        itinerary.len(),
        total_stops,
        label
    );

    Itinerary { itinerary, summary }
}

/// Interpret a client-supplied day count
///
/// Numbers truncate toward zero, strings are read by their leading integer,
/// anything else (or zero) means one day. The result is clamped to `[1, 7]`.
pub fn parse_days(value: Option<&Value>) -> usize {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => leading_integer(s),
        _ => None,
    };

    let days = match parsed {
        Some(0) | None => 1,
        Some(d) => d,
    };

    days.clamp(MIN_DAYS, MAX_DAYS) as usize
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Saturate absurdly long inputs; they clamp to MAX_DAYS anyway
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(days: Value, preferences: &str) -> ItineraryRequest {
        ItineraryRequest {
            start: Some(Endpoint::at(Coordinates::new(40.0, -74.0))),
            destination: Some(Endpoint::at(Coordinates::new(42.0, -70.0))),
            days: Some(days),
            preferences: Some(preferences.to_string()),
        }
    }

    #[test]
    fn test_every_day_count_produces_matching_buckets() {
        for days in 1..=7usize {
            let it = generate(&request(json!(days), "food")).unwrap();

            assert_eq!(it.itinerary.len(), days);
            assert_eq!(it.stop_count(), days * 2 - 1);

            // Stops appear exactly once, in interpolation order
            let names: Vec<String> = it.stops().map(|s| s.name.clone()).collect();
            let expected: Vec<String> = (1..=days * 2 - 1)
                .map(|i| format!("Suggested stop {}", i))
                .collect();
            assert_eq!(names, expected);

            for (i, plan) in it.itinerary.iter().enumerate() {
                assert_eq!(plan.day, i + 1);
            }
        }
    }

    #[test]
    fn test_one_day_has_one_stop_at_midpoint() {
        let it = generate(&request(json!(1), "")).unwrap();

        assert_eq!(it.itinerary.len(), 1);
        assert_eq!(it.stop_count(), 1);
        let stop = &it.itinerary[0].stops[0];
        assert_eq!(stop.coords, Coordinates::new(41.0, -72.0));
    }

    #[test]
    fn test_three_days_split_two_two_one() {
        let it = generate(&request(json!(3), "museums")).unwrap();

        let sizes: Vec<usize> = it.itinerary.iter().map(|d| d.stops.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(it.summary.contains("3 day(s)"));
        assert!(it.summary.contains("5 stops"));
    }

    #[test]
    fn test_stops_lie_strictly_between_endpoints() {
        let it = generate(&request(json!(7), "")).unwrap();

        for stop in it.stops() {
            assert!(stop.coords.lat > 40.0 && stop.coords.lat < 42.0);
            assert!(stop.coords.lng > -74.0 && stop.coords.lng < -70.0);
        }
    }

    #[test]
    fn test_notes_embed_preferences() {
        let it = generate(&request(json!(2), "beaches")).unwrap();
        assert!(it.stops().all(|s| s.note.contains("beaches")));

        let it = generate(&request(json!(2), "")).unwrap();
        assert!(it.stops().all(|s| s.note.ends_with("general")));
    }

    #[test]
    fn test_missing_coords_is_validation_error() {
        let mut req = request(json!(2), "");
        req.destination = Some(Endpoint::default());

        match generate(&req) {
            Err(Error::Validation(msg)) => assert_eq!(msg, MISSING_COORDS),
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut req = request(json!(2), "");
        req.start = None;
        assert!(matches!(generate(&req), Err(Error::Validation(_))));
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(None), 1);
        assert_eq!(parse_days(Some(&json!(null))), 1);
        assert_eq!(parse_days(Some(&json!(0))), 1);
        assert_eq!(parse_days(Some(&json!(-4))), 1);
        assert_eq!(parse_days(Some(&json!(3))), 3);
        assert_eq!(parse_days(Some(&json!(3.9))), 3);
        assert_eq!(parse_days(Some(&json!(30))), 7);
        assert_eq!(parse_days(Some(&json!("5"))), 5);
        assert_eq!(parse_days(Some(&json!(" 4 days"))), 4);
        assert_eq!(parse_days(Some(&json!("abc"))), 1);
        assert_eq!(parse_days(Some(&json!("99999999999999999999999"))), 7);
        assert_eq!(parse_days(Some(&json!(true))), 1);
    }

    #[test]
    fn test_request_deserializes_from_client_json() {
        let req: ItineraryRequest = serde_json::from_value(json!({
            "start": {"name": "A", "coords": [1.0, 2.0]},
            "destination": {"coords": [3.0, 4.0]},
            "days": "2"
        }))
        .unwrap();

        let it = generate(&req).unwrap();
        assert_eq!(it.itinerary.len(), 2);
        assert!(it.summary.contains("general"));
    }
}
