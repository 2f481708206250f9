//! rijnagent: Rhine water-level monitoring and travel-time estimation.
//!
//! # Module structure
//!
//! ```text
//! rijnagent
//! ├── model       - shared data types (Sample, TimeSeries, CurrentMeasurement, PegelError)
//! ├── config      - agent configuration from environment variables (.env)
//! ├── stations    - station registry loader (stations.toml)
//! ├── state       - last observed level per station, for trend arrows
//! ├── logging     - leveled logger tagged by data source and station
//! ├── ingest
//! │   ├── pegelonline - PEGELONLINE REST API: URL construction, parsing, fetching
//! │   └── fixtures (test only) - representative API response payloads
//! ├── analysis
//! │   ├── resample - overlap window and linear interpolation onto a fixed grid
//! │   ├── lag      - cross-correlation travel-time estimator
//! │   └── trend    - rising/falling classification against the previous run
//! ├── chart       - per-station SVG charts
//! ├── report      - Markdown summary message
//! ├── notify
//! │   ├── telegram - Telegram Bot API
//! │   └── twilio   - WhatsApp via Twilio
//! └── agent       - one run: fetch, chart, analyze, report, deliver
//! ```

pub mod agent;
pub mod analysis;
pub mod chart;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod notify;
pub mod report;
pub mod state;
pub mod stations;
