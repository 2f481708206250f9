/// Station registry loader - parses stations.toml
///
/// Keeps station ids and the upstream/downstream pairing out of the code,
/// so stations can be added or re-paired without recompiling. This is the
/// single source of truth for which PEGELONLINE stations are monitored and
/// in which order they appear in the summary message.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default registry location, relative to the working directory.
pub const DEFAULT_STATIONS_FILE: &str = "stations.toml";

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// A monitored gauge station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    /// Display name, also the key used by `upstream` and the trend store.
    pub name: String,
    /// PEGELONLINE station UUID (the shortname works too).
    pub uuid: String,
    /// Water body, informational.
    #[serde(default)]
    pub river: Option<String>,
    /// Name of the station whose series is the lag-estimation reference
    /// for this one. Stations without an upstream get no travel-time line.
    #[serde(default)]
    pub upstream: Option<String>,
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Deserialize)]
struct StationRegistry {
    station: Vec<Station>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StationsError {
    /// The registry file could not be read.
    Io { path: String, source: std::io::Error },
    /// The file is not valid TOML or does not match the expected shape.
    Parse(String),
    /// The registry parsed but is not usable.
    Invalid(String),
}

impl std::fmt::Display for StationsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationsError::Io { path, source } => {
                write!(f, "Failed to read station registry {}: {}\n\n", path, source)?;
                write!(f, "  Run from the project root or set STATIONS_FILE to the registry path.")
            }
            StationsError::Parse(msg) => write!(f, "Failed to parse station registry: {}", msg),
            StationsError::Invalid(msg) => write!(f, "Invalid station registry: {}", msg),
        }
    }
}

impl std::error::Error for StationsError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loads and validates the station registry from a TOML file.
pub fn load_stations<P: AsRef<Path>>(path: P) -> Result<Vec<Station>, StationsError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| StationsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_stations(&contents)
}

/// Parses and validates registry TOML.
///
/// Rejects an empty registry, duplicate names, empty ids and `upstream`
/// references that are unknown or point at the station itself.
pub fn parse_stations(contents: &str) -> Result<Vec<Station>, StationsError> {
    let registry: StationRegistry =
        toml::from_str(contents).map_err(|e| StationsError::Parse(e.to_string()))?;
    let stations = registry.station;

    if stations.is_empty() {
        return Err(StationsError::Invalid("no stations configured".to_string()));
    }

    let mut names = HashSet::new();
    for station in &stations {
        if station.name.trim().is_empty() || station.uuid.trim().is_empty() {
            return Err(StationsError::Invalid(format!(
                "station '{}' must have a non-empty name and uuid",
                station.name
            )));
        }
        if !names.insert(station.name.as_str()) {
            return Err(StationsError::Invalid(format!("duplicate station '{}'", station.name)));
        }
    }

    for station in &stations {
        if let Some(upstream) = &station.upstream {
            if upstream == &station.name {
                return Err(StationsError::Invalid(format!(
                    "station '{}' cannot be its own upstream",
                    station.name
                )));
            }
            if !names.contains(upstream.as_str()) {
                return Err(StationsError::Invalid(format!(
                    "station '{}' references unknown upstream '{}'",
                    station.name, upstream
                )));
            }
        }
    }

    Ok(stations)
}

/// Looks up a station by name. Returns `None` if not found.
pub fn find_station<'a>(stations: &'a [Station], name: &str) -> Option<&'a Station> {
    stations.iter().find(|s| s.name == name)
}

/// ASCII-safe, lowercase file stem for a station name
/// (`DÜSSELDORF` → `duesseldorf`).
pub fn safe_station_filename(name: &str) -> String {
    name.to_lowercase()
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
