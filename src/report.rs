/// Summary message formatting.
///
/// Produces the Markdown text sent to the chat channel. Formatting is kept
/// free of I/O and clocks (the timestamp is passed in) so the exact layout
/// can be asserted in tests.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::analysis::trend::Trend;

// ---------------------------------------------------------------------------
// Report lines
// ---------------------------------------------------------------------------

/// What the message says about one station.
#[derive(Debug, Clone, PartialEq)]
pub enum StationStatus {
    /// Current level in whole cm with its trend against the previous run.
    Level {
        value_cm: i64,
        trend: Trend,
        /// Change since the previous run, whole cm. `None` on the first run.
        delta_cm: Option<i64>,
    },
    /// The station answered but has no current water-level reading.
    NoCurrentValue,
    /// Fetching the station failed.
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationLine {
    pub name: String,
    pub status: StationStatus,
}

/// An estimated travel time between two stations, in whole grid steps (hours).
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTime {
    pub upstream: String,
    pub target: String,
    pub hours: usize,
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn format_station_line(line: &StationLine) -> String {
    match &line.status {
        StationStatus::Level { value_cm, trend, delta_cm } => {
            let mut text = format!("*{}*: {} cm", line.name, value_cm);
            if *trend != Trend::Unknown {
                text.push(' ');
                text.push_str(trend.arrow());
            }
            if let Some(delta) = delta_cm {
                text.push_str(&format!(" ({:+})", delta));
            }
            text
        }
        StationStatus::NoCurrentValue => format!("*{}*: no current value", line.name),
        StationStatus::FetchFailed => format!("*{}*: error fetching data", line.name),
    }
}

pub fn format_travel_time(travel: &TravelTime) -> String {
    format!("{} → {}: ≈ {} h", travel.upstream, travel.target, travel.hours)
}

/// Builds the full summary message.
///
/// Stations appear in the order given. The travel-time section is left out
/// entirely when no pair produced an estimate.
pub fn build_message<Tz>(
    hours_back: u32,
    generated_at: &DateTime<Tz>,
    stations: &[StationLine],
    travel_times: &[TravelTime],
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![
        format!("🌊 *Rhine water levels – last {} hours*", hours_back),
        format!("⏰ {}", generated_at.format("%d-%m-%Y %H:%M")),
        String::new(),
    ];

    lines.extend(stations.iter().map(format_station_line));

    if !travel_times.is_empty() {
        lines.push(String::new());
        lines.push("⏱ *Travel time*".to_string());
        lines.extend(travel_times.iter().map(format_travel_time));
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
