/// PEGELONLINE REST API v2 client.
///
/// Handles URL construction, JSON response parsing and blocking fetches for
/// the German federal waterways gauge service:
///   https://www.pegelonline.wsv.de/webservices/rest-api/v2
///
/// Two resources are used:
///   /stations/{station}.json?includeTimeseries=true&includeCurrentMeasurement=true
///   /stations/{station}/W/measurements.json?start=P2D
///
/// `{station}` may be the station UUID or its shortname (e.g. `KÖLN`); it is
/// percent-encoded either way. See `fixtures.rs` for annotated examples of
/// both response shapes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::logging::{self, DataSource};
use crate::model::{CurrentMeasurement, PegelError, Sample};

pub const DEFAULT_BASE_URL: &str = "https://www.pegelonline.wsv.de/webservices/rest-api/v2";

/// Shortname of the water-level timeseries.
pub const WATER_LEVEL_SERIES: &str = "W";

const CURRENT_TIMEOUT: Duration = Duration::from_secs(30);
const HISTORY_TIMEOUT: Duration = Duration::from_secs(45);

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct StationResponse {
    timeseries: Option<Vec<TimeseriesEntry>>,
}

#[derive(Deserialize)]
struct TimeseriesEntry {
    unit: Option<String>,
    #[serde(rename = "currentMeasurement")]
    current_measurement: Option<RawMeasurement>,
}

/// One measurement as it appears on the wire. Both fields are optional here
/// so a single bad entry can be rejected without failing the whole array.
#[derive(Deserialize)]
struct RawMeasurement {
    timestamp: Option<String>,
    value: Option<serde_json::Value>,
}

impl RawMeasurement {
    /// Parse-then-validate: RFC 3339 timestamp and a finite numeric value.
    /// Values sent as numeric strings are accepted.
    fn validate(&self) -> Result<Sample, String> {
        let raw_ts = self.timestamp.as_deref().ok_or("missing timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(raw_ts)
            .map_err(|e| format!("invalid timestamp '{}': {}", raw_ts, e))?
            .with_timezone(&Utc);

        let value = match &self.value {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("missing or non-numeric value at {}", raw_ts))?;

        if !value.is_finite() {
            return Err(format!("non-finite value at {}", raw_ts));
        }

        Ok(Sample::new(timestamp, value))
    }
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds the station resource URL including timeseries metadata and the
/// current measurement of each timeseries.
pub fn station_url(base_url: &str, station: &str) -> String {
    format!(
        "{}/stations/{}.json?includeTimeseries=true&includeCurrentMeasurement=true",
        base_url.trim_end_matches('/'),
        urlencoding::encode(station)
    )
}

/// Builds the water-level measurements URL covering the last `hours` hours.
pub fn measurements_url(base_url: &str, station: &str, hours: u32) -> String {
    format!(
        "{}/stations/{}/{}/measurements.json?start={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(station),
        WATER_LEVEL_SERIES,
        iso_period(hours)
    )
}

/// ISO 8601 period for a look-back in hours: whole days as `P{n}D`,
/// anything else as `PT{n}H`.
fn iso_period(hours: u32) -> String {
    if hours > 0 && hours % 24 == 0 {
        format!("P{}D", hours / 24)
    } else {
        format!("PT{}H", hours)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extracts the current water level from a station resource.
///
/// Returns the `currentMeasurement` of the first timeseries whose unit is
/// `cm` (case-insensitive). `Ok(None)` when no such timeseries exists or its
/// current measurement is unusable.
///
/// # Errors
/// - `PegelError::ParseError` - malformed JSON or unexpected envelope.
pub fn parse_current_response(json: &str) -> Result<Option<CurrentMeasurement>, PegelError> {
    let response: StationResponse = serde_json::from_str(json)
        .map_err(|e| PegelError::ParseError(format!("JSON deserialization failed: {}", e)))?;

    for series in response.timeseries.unwrap_or_default() {
        let is_cm = series
            .unit
            .as_deref()
            .map(|u| u.eq_ignore_ascii_case("cm"))
            .unwrap_or(false);

        let Some(raw) = series.current_measurement.filter(|_| is_cm) else {
            continue;
        };

        return match raw.validate() {
            Ok(sample) => Ok(Some(CurrentMeasurement {
                timestamp: sample.timestamp,
                value_cm: sample.value,
            })),
            Err(reason) => {
                logging::debug(DataSource::Pegelonline, None, &format!("current measurement rejected: {}", reason));
                Ok(None)
            }
        };
    }

    Ok(None)
}

/// Parses a `measurements.json` array into samples sorted by timestamp.
///
/// Entries without a valid timestamp or numeric value are skipped; an empty
/// array yields an empty vector (a station can legitimately report nothing
/// during an outage).
///
/// # Errors
/// - `PegelError::ParseError` - malformed JSON or a top-level value that is
///   not an array.
pub fn parse_measurements_response(json: &str) -> Result<Vec<Sample>, PegelError> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| PegelError::ParseError(format!("JSON deserialization failed: {}", e)))?;

    let mut samples = Vec::with_capacity(entries.len());
    let mut rejected = 0usize;

    for entry in entries {
        let parsed = serde_json::from_value::<RawMeasurement>(entry)
            .map_err(|e| e.to_string())
            .and_then(|raw| raw.validate());

        match parsed {
            Ok(sample) => samples.push(sample),
            Err(_) => rejected += 1,
        }
    }

    if rejected > 0 {
        logging::debug(
            DataSource::Pegelonline,
            None,
            &format!("skipped {} malformed measurement(s)", rejected),
        );
    }

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetches the current water level for `station`.
pub fn fetch_current(
    client: &Client,
    base_url: &str,
    station: &str,
) -> Result<Option<CurrentMeasurement>, PegelError> {
    let body = get_body(client, &station_url(base_url, station), CURRENT_TIMEOUT)?;
    parse_current_response(&body)
}

/// Fetches the water-level history of the last `hours` hours for `station`.
pub fn fetch_history(
    client: &Client,
    base_url: &str,
    station: &str,
    hours: u32,
) -> Result<Vec<Sample>, PegelError> {
    let body = get_body(client, &measurements_url(base_url, station, hours), HISTORY_TIMEOUT)?;
    parse_measurements_response(&body)
}

fn get_body(client: &Client, url: &str, timeout: Duration) -> Result<String, PegelError> {
    logging::debug(DataSource::Pegelonline, None, &format!("GET {}", url));

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .timeout(timeout)
        .send()
        .map_err(|e| PegelError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PegelError::HttpError(response.status().as_u16()));
    }

    response.text().map_err(|e| PegelError::Transport(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use chrono::TimeZone;

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_station_url_requests_timeseries_and_current_measurement() {
        let url = station_url(DEFAULT_BASE_URL, "593647aa-9fea-43ec-a7d6-6476a76ae868");
        assert!(url.starts_with(DEFAULT_BASE_URL), "must target the v2 API, got: {}", url);
        assert!(url.contains("/stations/593647aa-9fea-43ec-a7d6-6476a76ae868.json"));
        assert!(url.contains("includeTimeseries=true"));
        assert!(url.contains("includeCurrentMeasurement=true"));
    }

    #[test]
    fn test_station_url_percent_encodes_umlauts() {
        let url = station_url(DEFAULT_BASE_URL, "KÖLN");
        assert!(url.contains("/stations/K%C3%96LN.json"), "shortname should be encoded, got: {}", url);
    }

    #[test]
    fn test_measurements_url_uses_whole_days_when_possible() {
        let url = measurements_url(DEFAULT_BASE_URL, "BONN", 48);
        assert!(url.contains("/stations/BONN/W/measurements.json"), "got: {}", url);
        assert!(url.ends_with("start=P2D"), "48 hours should be P2D, got: {}", url);
    }

    #[test]
    fn test_measurements_url_falls_back_to_hours() {
        let url = measurements_url(DEFAULT_BASE_URL, "BONN", 36);
        assert!(url.ends_with("start=PT36H"), "got: {}", url);
    }

    #[test]
    fn test_trailing_slash_in_base_url_is_ignored() {
        let url = station_url("https://example.org/api/", "BONN");
        assert!(url.starts_with("https://example.org/api/stations/BONN.json"), "got: {}", url);
    }

    // --- Current measurement ------------------------------------------------

    #[test]
    fn test_parse_current_returns_cm_measurement() {
        let current = parse_current_response(fixture_bonn_station_json())
            .expect("valid fixture should parse")
            .expect("Bonn fixture has a current measurement");

        assert!((current.value_cm - 312.0).abs() < 1e-9, "got {}", current.value_cm);
        assert_eq!(current.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_current_skips_non_cm_timeseries() {
        // Discharge (m3/s) comes first in the fixture and must not be picked.
        let current = parse_current_response(fixture_station_with_discharge_first_json())
            .expect("fixture should parse")
            .expect("water level timeseries is present");
        assert!((current.value_cm - 455.0).abs() < 1e-9, "got {}", current.value_cm);
    }

    #[test]
    fn test_parse_current_without_timeseries_is_none() {
        let current = parse_current_response(r#"{ "uuid": "x", "shortname": "BONN" }"#)
            .expect("envelope is valid");
        assert!(current.is_none());
    }

    #[test]
    fn test_parse_current_with_unparseable_value_is_none() {
        let json = r#"{
          "timeseries": [{
            "shortname": "W", "unit": "cm",
            "currentMeasurement": { "timestamp": "2024-05-01T12:00:00+02:00", "value": "n/a" }
          }]
        }"#;
        assert_eq!(parse_current_response(json), Ok(None));
    }

    #[test]
    fn test_parse_current_malformed_json_is_parse_error() {
        let result = parse_current_response("{ not json");
        assert!(matches!(result, Err(PegelError::ParseError(_))), "got {:?}", result);
    }

    // --- Measurements -------------------------------------------------------

    #[test]
    fn test_parse_measurements_returns_sorted_samples() {
        let samples = parse_measurements_response(fixture_bonn_measurements_json())
            .expect("valid fixture should parse");
        assert_eq!(samples.len(), 5);
        assert!(
            samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "samples must be sorted ascending"
        );
        assert!((samples[0].value - 305.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_measurements_converts_offsets_to_utc() {
        let samples = parse_measurements_response(fixture_bonn_measurements_json())
            .expect("valid fixture should parse");
        assert_eq!(samples[0].timestamp, Utc.with_ymd_and_hms(2024, 4, 30, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_measurements_skips_malformed_entries() {
        let samples = parse_measurements_response(fixture_measurements_with_garbage_json())
            .expect("array envelope is valid");
        assert_eq!(samples.len(), 2, "only the two well-formed entries should survive");
        assert!((samples[1].value - 301.5).abs() < 1e-9, "numeric strings are accepted");
    }

    #[test]
    fn test_parse_measurements_empty_array_is_empty() {
        assert_eq!(parse_measurements_response("[]"), Ok(vec![]));
    }

    #[test]
    fn test_parse_measurements_non_array_is_parse_error() {
        let result = parse_measurements_response(r#"{ "status": 404 }"#);
        assert!(matches!(result, Err(PegelError::ParseError(_))), "got {:?}", result);
    }

    #[test]
    #[ignore] // Requires network access
    fn test_fetch_live_bonn_history() {
        let client = Client::new();
        let samples = fetch_history(&client, DEFAULT_BASE_URL, "BONN", 48)
            .expect("PEGELONLINE should answer");
        assert!(!samples.is_empty());
    }
}
