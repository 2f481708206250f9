/// Core data types for the Rhine water-level agent.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O; the only logic is the normalization a `TimeSeries`
/// performs when it is built from raw samples.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Sample types
// ---------------------------------------------------------------------------

/// A single water-level measurement.
///
/// Produced by the ingest layer after strict parsing of a PEGELONLINE
/// `measurements.json` entry. The value unit is whatever the source reports
/// (centimeters for the `W` timeseries); the analysis code is unit-agnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// An ordered, duplicate-free sequence of samples.
///
/// Built fresh from raw samples for every analysis call and never mutated
/// afterwards. Construction drops non-finite values, sorts ascending by
/// timestamp and keeps the first sample of any run of identical timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn from_samples(raw: &[Sample]) -> Self {
        let mut samples: Vec<Sample> = raw
            .iter()
            .copied()
            .filter(|s| s.value.is_finite())
            .collect();

        // Stable sort so "first occurrence wins" is well defined for dedup.
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);

        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// The latest reading PEGELONLINE reports for a station's water-level
/// timeseries (`currentMeasurement` in the station resource).
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentMeasurement {
    pub timestamp: DateTime<Utc>,
    pub value_cm: f64,
}

impl CurrentMeasurement {
    /// Whole centimeters, truncated toward zero, as shown in the summary.
    pub fn whole_cm(&self) -> i64 {
        self.value_cm.trunc() as i64
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing PEGELONLINE data.
#[derive(Debug, PartialEq)]
pub enum PegelError {
    /// Non-2xx HTTP response from the API.
    HttpError(u16),
    /// The request never produced a response (DNS, TLS, timeout, ...).
    Transport(String),
    /// The response body could not be deserialized.
    ParseError(String),
}

impl std::fmt::Display for PegelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PegelError::HttpError(code) => write!(f, "HTTP error: {}", code),
            PegelError::Transport(msg) => write!(f, "Transport error: {}", msg),
            PegelError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for PegelError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_time_series_sorts_samples_ascending() {
        let raw = vec![
            Sample::new(t0() + Duration::hours(2), 3.0),
            Sample::new(t0(), 1.0),
            Sample::new(t0() + Duration::hours(1), 2.0),
        ];
        let series = TimeSeries::from_samples(&raw);
        let values: Vec<f64> = series.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0], "samples should be sorted by timestamp");
        assert_eq!(series.start(), Some(t0()));
        assert_eq!(series.end(), Some(t0() + Duration::hours(2)));
    }

    #[test]
    fn test_time_series_keeps_first_of_duplicate_timestamps() {
        let raw = vec![
            Sample::new(t0(), 10.0),
            Sample::new(t0() + Duration::hours(1), 20.0),
            Sample::new(t0(), 99.0),
        ];
        let series = TimeSeries::from_samples(&raw);
        assert_eq!(series.len(), 2, "duplicate timestamp should collapse to one sample");
        assert_eq!(series.samples()[0].value, 10.0, "first occurrence should win");
    }

    #[test]
    fn test_time_series_drops_non_finite_values() {
        let raw = vec![
            Sample::new(t0(), f64::NAN),
            Sample::new(t0() + Duration::hours(1), f64::INFINITY),
            Sample::new(t0() + Duration::hours(2), 5.0),
        ];
        let series = TimeSeries::from_samples(&raw);
        assert_eq!(series.len(), 1);
        assert_eq!(series.samples()[0].value, 5.0);
    }

    #[test]
    fn test_empty_time_series_has_no_bounds() {
        let series = TimeSeries::from_samples(&[]);
        assert!(series.is_empty());
        assert!(series.start().is_none());
        assert!(series.end().is_none());
    }

    #[test]
    fn test_current_measurement_truncates_to_whole_cm() {
        let m = CurrentMeasurement { timestamp: t0(), value_cm: 312.9 };
        assert_eq!(m.whole_cm(), 312);
    }

    #[test]
    fn test_pegel_error_display_mentions_status_code() {
        assert_eq!(PegelError::HttpError(503).to_string(), "HTTP error: 503");
        assert!(PegelError::ParseError("bad".into()).to_string().contains("bad"));
    }
}
