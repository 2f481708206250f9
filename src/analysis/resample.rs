/// Uniform-grid resampling of irregular time series.
///
/// PEGELONLINE reports water levels every 15 minutes, but gaps, outages and
/// differing station clocks mean two stations never share timestamps. Before
/// two series can be compared index-for-index they are linearly interpolated
/// onto the same uniform grid spanning the window both series cover.

use chrono::{DateTime, Duration, Utc};

use crate::model::TimeSeries;

// ---------------------------------------------------------------------------
// Overlap window
// ---------------------------------------------------------------------------

/// Returns `(max(starts), min(ends))` for two series, or `None` when either
/// series is empty or the ranges do not intersect.
pub fn overlap_window(
    a: &TimeSeries,
    b: &TimeSeries,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = a.start()?.max(b.start()?);
    let end = a.end()?.min(b.end()?);

    if end < start {
        return None;
    }
    Some((start, end))
}

// ---------------------------------------------------------------------------
// Sampled grid
// ---------------------------------------------------------------------------

/// A time series resampled onto `start, start + step, start + 2·step, …`
/// up to and including the last grid point not after the window end.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledGrid {
    start: DateTime<Utc>,
    step_seconds: i64,
    values: Vec<f64>,
}

impl SampledGrid {
    /// Linearly interpolates `series` onto the grid covering `[start, end]`.
    ///
    /// Grid points outside the series' own range take the nearest endpoint
    /// value (no extrapolation). Returns `None` for an empty series, a
    /// non-positive step or an inverted window.
    pub fn resample(
        series: &TimeSeries,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: i64,
    ) -> Option<Self> {
        if series.is_empty() || step_seconds <= 0 || end < start {
            return None;
        }

        let samples = series.samples();
        let origin = start.timestamp();
        let count = ((end.timestamp() - origin) / step_seconds + 1) as usize;

        let mut values = Vec::with_capacity(count);
        let mut j = 0;

        for k in 0..count {
            let t = origin + k as i64 * step_seconds;

            // Advance to the last sample at or before t.
            while j + 1 < samples.len() && samples[j + 1].timestamp.timestamp() <= t {
                j += 1;
            }

            let left = samples[j];
            let left_t = left.timestamp.timestamp();

            let value = if left_t >= t || j + 1 == samples.len() {
                left.value
            } else {
                let right = samples[j + 1];
                let right_t = right.timestamp.timestamp();
                let frac = (t - left_t) as f64 / (right_t - left_t) as f64;
                left.value + (right.value - left.value) * frac
            };

            values.push(value);
        }

        Some(Self { start, step_seconds, values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp of grid point `index`.
    pub fn time_at(&self, index: usize) -> DateTime<Utc> {
        self.start + Duration::seconds(index as i64 * self.step_seconds)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
