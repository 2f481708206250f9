/// Rising/falling classification of a station's current water level against
/// the value observed on the previous run.

/// Direction of change since the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Steady,
    /// No previous value to compare against (first run, new station).
    Unknown,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Rising => "↑",
            Trend::Falling => "↓",
            Trend::Steady => "→",
            Trend::Unknown => "",
        }
    }
}

/// Classifies `current` relative to `previous`.
///
/// A change counts as rising or falling only when its magnitude is strictly
/// greater than `threshold_cm`; anything within the threshold is steady.
pub fn classify(previous: Option<f64>, current: f64, threshold_cm: f64) -> Trend {
    let Some(previous) = previous else {
        return Trend::Unknown;
    };

    let delta = current - previous;
    if delta > threshold_cm {
        Trend::Rising
    } else if delta < -threshold_cm {
        Trend::Falling
    } else {
        Trend::Steady
    }
}
