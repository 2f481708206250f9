/// Integration tests for the summary pipeline
///
/// These tests run the agent's analysis path on canned PEGELONLINE payloads:
/// parse → estimate travel times → classify trends → format message.
/// Nothing is fetched or delivered.
///
/// Run with: cargo test --test report_pipeline

use rijnagent::agent::{station_line, travel_times, StationFetch};
use rijnagent::analysis::lag::LagConfig;
use rijnagent::ingest::pegelonline::{parse_current_response, parse_measurements_response};
use rijnagent::model::PegelError;
use rijnagent::report::build_message;
use rijnagent::state::TrendStore;
use rijnagent::stations::parse_stations;

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use serde_json::json;

// ---------------------------------------------------------------------------
// Canned payloads
// ---------------------------------------------------------------------------

const REGISTRY: &str = r#"
    [[station]]
    name = "BONN"
    uuid = "593647aa-9fea-43ec-a7d6-6476a76ae868"
    river = "RHEIN"

    [[station]]
    name = "KÖLN"
    uuid = "a6ee8177-107b-47dd-bcfd-30960ccc6e9c"
    river = "RHEIN"
    upstream = "BONN"

    [[station]]
    name = "DÜSSELDORF"
    uuid = "8f7e5f92-1153-4f93-acba-ca48670c8ca9"
    river = "RHEIN"
    upstream = "BONN"
"#;

/// 48 h of 15-minute readings in German summer time with a flood wave
/// peaking `peak_hour` hours into the window.
fn measurements_json(peak_hour: f64, base_cm: f64) -> String {
    let cest = FixedOffset::east_opt(2 * 3600).unwrap();
    let start = cest.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    let entries: Vec<serde_json::Value> = (0..48 * 4)
        .map(|i| {
            let h = i as f64 / 4.0;
            let value = base_cm + 140.0 * (-((h - peak_hour) / 5.0).powi(2)).exp();
            json!({
                "timestamp": (start + Duration::minutes(15 * i)).to_rfc3339(),
                "value": (value * 10.0).round() / 10.0,
            })
        })
        .collect();

    serde_json::to_string(&entries).unwrap()
}

fn station_json(shortname: &str, value_cm: f64) -> String {
    json!({
        "uuid": "00000000-0000-0000-0000-000000000000",
        "shortname": shortname,
        "timeseries": [{
            "shortname": "W",
            "unit": "cm",
            "currentMeasurement": { "timestamp": "2024-05-03T00:00:00+02:00", "value": value_cm }
        }]
    })
    .to_string()
}

fn fetch(name: &str, upstream: Option<&str>, current_cm: f64, peak_hour: f64) -> StationFetch {
    StationFetch {
        name: name.to_string(),
        upstream: upstream.map(String::from),
        current: parse_current_response(&station_json(name, current_cm)),
        history: parse_measurements_response(&measurements_json(peak_hour, current_cm - 20.0)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_canned_payloads_produce_full_summary() {
    let stations = parse_stations(REGISTRY).expect("registry should parse");
    assert_eq!(stations.len(), 3);

    let fetches = vec![
        fetch("BONN", None, 312.0, 16.0),
        fetch("KÖLN", Some("BONN"), 455.0, 20.0),
        fetch("DÜSSELDORF", Some("BONN"), 398.0, 23.0),
    ];
    for f in &fetches {
        assert_eq!(f.history_samples().len(), 192, "{} should have 48 h of samples", f.name);
    }

    let travel = travel_times(&fetches, &LagConfig::default());
    let hours: Vec<(String, usize)> = travel.iter().map(|t| (t.target.clone(), t.hours)).collect();
    assert_eq!(hours, vec![("KÖLN".to_string(), 4), ("DÜSSELDORF".to_string(), 7)]);

    let mut store = TrendStore::default();
    store.record("BONN", 309.0);
    store.record("KÖLN", 456.0);
    let lines: Vec<_> = fetches.iter().map(|f| station_line(f, &mut store, 2.0)).collect();

    let at = Utc.with_ymd_and_hms(2024, 5, 3, 6, 0, 0).unwrap();
    let message = build_message(48, &at, &lines, &travel);

    assert!(message.contains("*BONN*: 312 cm ↑ (+3)"), "message:\n{}", message);
    assert!(message.contains("*KÖLN*: 455 cm → (-1)"), "message:\n{}", message);
    assert!(message.contains("*DÜSSELDORF*: 398 cm\n"), "first sighting has no arrow:\n{}", message);
    assert!(message.contains("BONN → KÖLN: ≈ 4 h"), "message:\n{}", message);
    assert!(message.ends_with("BONN → DÜSSELDORF: ≈ 7 h"), "message:\n{}", message);
}

#[test]
fn test_failed_upstream_drops_travel_section() {
    let mut bonn = fetch("BONN", None, 312.0, 16.0);
    bonn.current = Err(PegelError::HttpError(503));
    bonn.history = Err(PegelError::HttpError(503));
    let fetches = vec![bonn, fetch("KÖLN", Some("BONN"), 455.0, 20.0)];

    let travel = travel_times(&fetches, &LagConfig::default());
    assert!(travel.is_empty(), "no reference history, no travel time");

    let mut store = TrendStore::default();
    let lines: Vec<_> = fetches.iter().map(|f| station_line(f, &mut store, 2.0)).collect();
    let message = build_message(48, &Utc::now(), &lines, &travel);

    assert!(message.contains("*BONN*: error fetching data"), "message:\n{}", message);
    assert!(message.contains("*KÖLN*: 455 cm"), "message:\n{}", message);
    assert!(!message.contains("Travel time"), "section should be omitted:\n{}", message);
}

#[test]
fn test_station_without_water_level_series() {
    let json = json!({
        "uuid": "x",
        "shortname": "BONN",
        "timeseries": [{ "shortname": "Q", "unit": "m³/s",
            "currentMeasurement": { "timestamp": "2024-05-03T00:00:00+02:00", "value": 1450.0 } }]
    })
    .to_string();

    let fetch = StationFetch {
        name: "BONN".to_string(),
        upstream: None,
        current: parse_current_response(&json),
        history: Ok(Vec::new()),
    };
    let mut store = TrendStore::default();
    let line = station_line(&fetch, &mut store, 2.0);

    let message = build_message(48, &Utc::now(), &[line], &[]);
    assert!(message.contains("*BONN*: no current value"), "message:\n{}", message);
}
