/// Data analysis for the Rhine water-level agent.
///
/// Submodules:
/// - `resample` - linear interpolation of irregular series onto a uniform grid.
/// - `lag`      - travel-time (lag) estimation between an upstream and a
///                downstream station.
/// - `trend`    - rising/falling classification against the previous run.

pub mod lag;
pub mod resample;
pub mod trend;
