/// Last-observed-value store for trend arrows.
///
/// The agent runs once per schedule tick, so "is the river rising?" is
/// answered by comparing the current level with the level seen on the
/// previous run. That single number per station is kept in a small JSON
/// file next to the charts. Losing the file only costs one run's arrows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendStore {
    /// Station name → last observed value in cm.
    #[serde(default)]
    last_values: BTreeMap<String, f64>,

    /// When the store was last written.
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum StateError {
    Io(std::io::Error),
    Corrupt(String),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::Io(e) => write!(f, "State file I/O error: {}", e),
            StateError::Corrupt(msg) => write!(f, "State file is corrupt: {}", msg),
        }
    }
}

impl std::error::Error for StateError {}

impl TrendStore {
    /// Loads the store, starting empty if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(StateError::Io)?;
        serde_json::from_str(&contents).map_err(|e| StateError::Corrupt(e.to_string()))
    }

    /// Writes the store as pretty JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), StateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(StateError::Io)?;
        }

        self.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(self).map_err(|e| StateError::Corrupt(e.to_string()))?;
        fs::write(path, json).map_err(StateError::Io)
    }

    pub fn last_value(&self, station: &str) -> Option<f64> {
        self.last_values.get(station).copied()
    }

    /// Records `value` and returns the value it replaced.
    pub fn record(&mut self, station: &str, value: f64) -> Option<f64> {
        self.last_values.insert(station.to_string(), value)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
