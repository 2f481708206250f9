/// Test fixtures: representative JSON payloads from the PEGELONLINE API.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parsers.
///
/// Station resource shape (`/stations/{uuid}.json?includeTimeseries=true&includeCurrentMeasurement=true`):
///   .uuid, .shortname, .km, .water.shortname
///   .timeseries[]
///     .shortname            - "W" water level, "Q" discharge, ...
///     .unit                 - "cm" for water level
///     .currentMeasurement
///       .timestamp          - ISO 8601 with offset (local German time)
///       .value              - JSON number
///
/// Measurements shape (`/stations/{uuid}/W/measurements.json?start=P2D`):
///   [ { "timestamp": "...+02:00", "value": 305.0 }, ... ]

/// Bonn with a single water-level timeseries. Current level 312 cm.
#[cfg(test)]
pub(crate) fn fixture_bonn_station_json() -> &'static str {
    r#"{
      "uuid": "593647aa-9fea-43ec-a7d6-6476a76ae868",
      "number": "2710080",
      "shortname": "BONN",
      "longname": "BONN",
      "km": 654.8,
      "agency": "RHEIN",
      "longitude": 7.1117,
      "latitude": 50.7366,
      "water": { "shortname": "RHEIN", "longname": "RHEIN" },
      "timeseries": [
        {
          "shortname": "W",
          "longname": "WASSERSTAND ROHDATEN",
          "unit": "cm",
          "equidistance": 15,
          "currentMeasurement": {
            "timestamp": "2024-05-01T12:00:00+02:00",
            "value": 312.0,
            "stateMnwMhw": "normal",
            "stateNswHsw": "normal"
          },
          "gaugeZero": { "unit": "m. ü. NHN", "value": 42.93, "validFrom": "1990-11-01" }
        }
      ]
    }"#
}

/// A station where discharge is listed before water level. The parser must
/// select the `cm` timeseries, not the first one.
#[cfg(test)]
pub(crate) fn fixture_station_with_discharge_first_json() -> &'static str {
    r#"{
      "uuid": "a6ee8177-107b-47dd-bcfd-30960ccc6e9c",
      "shortname": "KÖLN",
      "timeseries": [
        {
          "shortname": "Q",
          "longname": "ABFLUSS",
          "unit": "m³/s",
          "currentMeasurement": { "timestamp": "2024-05-01T12:00:00+02:00", "value": 2480.0 }
        },
        {
          "shortname": "W",
          "longname": "WASSERSTAND ROHDATEN",
          "unit": "CM",
          "currentMeasurement": { "timestamp": "2024-05-01T12:00:00+02:00", "value": 455.0 }
        }
      ]
    }"#
}

/// Five quarter-hourly Bonn readings, deliberately out of order.
#[cfg(test)]
pub(crate) fn fixture_bonn_measurements_json() -> &'static str {
    r#"[
      { "timestamp": "2024-05-01T00:30:00+02:00", "value": 307.0 },
      { "timestamp": "2024-05-01T00:00:00+02:00", "value": 305.0 },
      { "timestamp": "2024-05-01T00:15:00+02:00", "value": 306.0 },
      { "timestamp": "2024-05-01T00:45:00+02:00", "value": 308.0 },
      { "timestamp": "2024-05-01T01:00:00+02:00", "value": 309.0 }
    ]"#
}

/// Two usable readings surrounded by the kinds of garbage seen during
/// station outages and API hiccups.
#[cfg(test)]
pub(crate) fn fixture_measurements_with_garbage_json() -> &'static str {
    r#"[
      { "timestamp": "2024-05-01T00:00:00+02:00", "value": 300.0 },
      { "value": 301.0 },
      { "timestamp": "yesterday", "value": 302.0 },
      { "timestamp": "2024-05-01T00:30:00+02:00", "value": null },
      42,
      { "timestamp": "2024-05-01T00:45:00+02:00", "value": "301.5" }
    ]"#
}
