/// Travel-time estimation between two gauge stations.
///
/// Given the water-level series of an upstream reference station and a
/// downstream target station, finds the whole number of grid steps by which
/// the target best reproduces a delayed copy of the reference. With the
/// default one-hour grid the result reads directly as "the water needs about
/// N hours from Bonn to Köln".
///
/// # Method
///
/// 1. Both series are deduplicated, sorted and linearly interpolated onto a
///    shared uniform grid covering only the window both series span.
/// 2. Each grid array is standardized (zero mean, unit variance).
/// 3. For every candidate lag `L` in `0..=max_lag_steps` the Pearson
///    correlation of `A[0..n-L]` against `B[L..n]` is computed. The scan
///    stops as soon as the shifted slice would be shorter than
///    `min_window_samples`.
/// 4. The lag with the highest correlation wins; ties go to the smaller lag.
///
/// The estimator is pure and total. Every degenerate input (empty or sparse
/// series, short or missing overlap, flat signal) produces
/// `LagEstimate::NoEstimate` rather than an error, because gaps and outages
/// are routine in gauge data.

use chrono::Duration;

use crate::analysis::resample::{overlap_window, SampledGrid};
use crate::model::{Sample, TimeSeries};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Search parameters for `estimate_lag`.
#[derive(Debug, Clone, PartialEq)]
pub struct LagConfig {
    /// Largest lag tried, inclusive, in grid steps (default: 72).
    pub max_lag_steps: usize,

    /// Resampling interval in seconds (default: 3600, one hour).
    pub grid_step_seconds: i64,

    /// Distinct samples each raw series needs (default: 10).
    pub min_samples: usize,

    /// Shortest usable overlap between the two series, in seconds
    /// (default: 6 hours).
    pub min_overlap_seconds: i64,

    /// Shortest shifted slice a correlation is computed over (default: 6).
    pub min_window_samples: usize,
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            max_lag_steps: 72,
            grid_step_seconds: 3600,
            min_samples: 10,
            min_overlap_seconds: 6 * 3600,
            min_window_samples: 6,
        }
    }
}

impl LagConfig {
    /// Default configuration with a different search bound.
    pub fn with_max_lag_steps(max_lag_steps: usize) -> Self {
        Self {
            max_lag_steps,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Why no lag could be estimated. Diagnostic only: callers treat every
/// variant the same way (omit the travel-time line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEstimateReason {
    EmptySeries,
    TooFewSamples,
    InsufficientOverlap,
    ConstantSignal,
    NoValidLag,
}

impl std::fmt::Display for NoEstimateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoEstimateReason::EmptySeries => write!(f, "empty series"),
            NoEstimateReason::TooFewSamples => write!(f, "too few samples"),
            NoEstimateReason::InsufficientOverlap => write!(f, "insufficient overlap"),
            NoEstimateReason::ConstantSignal => write!(f, "constant signal"),
            NoEstimateReason::NoValidLag => write!(f, "no lag with enough overlap"),
        }
    }
}

/// Outcome of a lag estimation.
///
/// A zero-step estimate (`Estimate { lag_steps: 0, .. }`) is a legitimate
/// result and is never used to signal "no estimate".
#[derive(Debug, Clone, PartialEq)]
pub enum LagEstimate {
    Estimate {
        /// Best-fit offset in grid steps, `0 ≤ lag_steps ≤ max_lag_steps`.
        lag_steps: usize,
        /// Pearson correlation at `lag_steps`, in `[-1, 1]`.
        correlation: f64,
    },
    NoEstimate(NoEstimateReason),
}

impl LagEstimate {
    /// The estimated lag in grid steps, if any.
    pub fn lag_steps(&self) -> Option<usize> {
        match self {
            LagEstimate::Estimate { lag_steps, .. } => Some(*lag_steps),
            LagEstimate::NoEstimate(_) => None,
        }
    }

    /// The estimated lag as a duration, given the grid step it was computed on.
    /// `None` without an estimate or when the duration is out of range.
    pub fn lag_duration(&self, grid_step_seconds: i64) -> Option<Duration> {
        let steps = i64::try_from(self.lag_steps()?).ok()?;
        steps.checked_mul(grid_step_seconds).and_then(Duration::try_seconds)
    }

    pub fn is_estimate(&self) -> bool {
        matches!(self, LagEstimate::Estimate { .. })
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Variance below this is treated as a flat signal.
const MIN_STD_DEV: f64 = 1e-9;

/// Estimates how many grid steps `target` lags behind `reference`.
///
/// See the module documentation for the method. Never panics and never
/// fails; every degenerate input maps to `LagEstimate::NoEstimate`.
pub fn estimate_lag(reference: &[Sample], target: &[Sample], config: &LagConfig) -> LagEstimate {
    if reference.is_empty() || target.is_empty() {
        return LagEstimate::NoEstimate(NoEstimateReason::EmptySeries);
    }

    let reference = TimeSeries::from_samples(reference);
    let target = TimeSeries::from_samples(target);

    if reference.is_empty() || target.is_empty() {
        return LagEstimate::NoEstimate(NoEstimateReason::EmptySeries);
    }
    if reference.len() < config.min_samples || target.len() < config.min_samples {
        return LagEstimate::NoEstimate(NoEstimateReason::TooFewSamples);
    }

    let (start, end) = match overlap_window(&reference, &target) {
        Some(window) => window,
        None => return LagEstimate::NoEstimate(NoEstimateReason::InsufficientOverlap),
    };
    if (end - start).num_seconds() < config.min_overlap_seconds {
        return LagEstimate::NoEstimate(NoEstimateReason::InsufficientOverlap);
    }

    let step = config.grid_step_seconds;
    let (a, b) = match (
        SampledGrid::resample(&reference, start, end, step),
        SampledGrid::resample(&target, start, end, step),
    ) {
        (Some(a), Some(b)) => (a, b),
        _ => return LagEstimate::NoEstimate(NoEstimateReason::InsufficientOverlap),
    };

    let (a, b) = match (standardize(a.values()), standardize(b.values())) {
        (Some(a), Some(b)) => (a, b),
        _ => return LagEstimate::NoEstimate(NoEstimateReason::ConstantSignal),
    };

    best_lag(&a, &b, config)
}

/// Scans lags `0..=max_lag_steps` and returns the best-correlated one.
fn best_lag(a: &[f64], b: &[f64], config: &LagConfig) -> LagEstimate {
    let n = a.len().min(b.len());
    let min_window = config.min_window_samples.max(2);
    let mut best: Option<(usize, f64)> = None;

    for lag in 0..=config.max_lag_steps {
        if lag >= n || n - lag < min_window {
            break;
        }

        let r = match pearson(&a[..n - lag], &b[lag..n]) {
            Some(r) => r,
            None => continue,
        };

        // Strictly greater keeps the first (smallest) lag on ties.
        if best.map_or(true, |(_, best_r)| r > best_r) {
            best = Some((lag, r));
        }
    }

    match best {
        Some((lag_steps, correlation)) => LagEstimate::Estimate { lag_steps, correlation },
        None => LagEstimate::NoEstimate(NoEstimateReason::NoValidLag),
    }
}

/// Mean and population standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Zero-mean, unit-variance copy of `values`, or `None` for a flat signal.
fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let (mean, std) = mean_std(values);
    if !std.is_finite() || std < MIN_STD_DEV {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std).collect())
}

/// Pearson correlation of two equal-length slices, `None` if either is flat.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.is_empty() {
        return None;
    }
    let (mx, sx) = mean_std(x);
    let (my, sy) = mean_std(y);
    if sx < MIN_STD_DEV || sy < MIN_STD_DEV {
        return None;
    }

    let n = x.len() as f64;
    let cov = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mx) * (yi - my))
        .sum::<f64>()
        / n;

    let r = cov / (sx * sy);
    if r.is_finite() { Some(r.clamp(-1.0, 1.0)) } else { None }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
