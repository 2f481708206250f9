/// The water-level agent.
///
/// One run of the agent:
/// 1. Fetches current level and recent history for every station, in parallel
/// 2. Renders a chart per station
/// 3. Estimates the travel time from each station's upstream reference
/// 4. Classifies the trend against the previous run
/// 5. Formats and delivers the summary message
/// 6. Saves the observed levels for the next run's trend arrows
///
/// A station that cannot be fetched shows up as such in the message; only a
/// delivery failure fails the run.

use chrono::{Local, Utc};
use reqwest::blocking::Client;
use std::error::Error;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use threadpool::ThreadPool;

use crate::analysis::lag::{estimate_lag, LagConfig, LagEstimate};
use crate::analysis::trend;
use crate::chart;
use crate::config::AgentConfig;
use crate::ingest::pegelonline;
use crate::logging::{self, DataSource};
use crate::model::{CurrentMeasurement, PegelError, Sample};
use crate::notify::{self, Notifier};
use crate::report::{self, StationLine, StationStatus, TravelTime};
use crate::state::TrendStore;
use crate::stations::Station;

/// Upper bound on concurrent station fetches.
const MAX_FETCH_WORKERS: usize = 8;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Fetch results
// ---------------------------------------------------------------------------

/// Everything fetched for one station in one run.
#[derive(Debug)]
pub struct StationFetch {
    pub name: String,
    pub upstream: Option<String>,
    pub current: Result<Option<CurrentMeasurement>, PegelError>,
    pub history: Result<Vec<Sample>, PegelError>,
}

impl StationFetch {
    /// History samples, empty if the history request failed.
    pub fn history_samples(&self) -> &[Sample] {
        self.history.as_deref().unwrap_or(&[])
    }

    /// Both the current level and the history came back.
    pub fn succeeded(&self) -> bool {
        self.current.is_ok() && self.history.is_ok()
    }
}

/// Outcome of one agent run.
#[derive(Debug)]
pub struct RunSummary {
    pub stations: usize,
    pub fetched: usize,
    pub charts: Vec<PathBuf>,
    pub travel_times: usize,
    pub delivered: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

pub struct Agent {
    config: AgentConfig,
    stations: Vec<Station>,
    client: Client,
    notifier: Option<Box<dyn Notifier>>,
}

impl Agent {
    /// Creates the agent. With `dry_run` no notifier is built and nothing is
    /// delivered or persisted.
    pub fn new(config: AgentConfig, stations: Vec<Station>, dry_run: bool) -> Result<Self, Box<dyn Error>> {
        if stations.is_empty() {
            return Err("No stations configured".into());
        }

        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(concat!("rijnagent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let notifier = if dry_run {
            None
        } else {
            notify::notifier_for(&config.channel, client.clone(), config.chart_base_url.clone())?
        };

        Ok(Self { config, stations, client, notifier })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Fetches all stations on a thread pool and returns the results in
    /// registry order.
    pub fn fetch_all(&self) -> Vec<StationFetch> {
        let workers = self.stations.len().clamp(1, MAX_FETCH_WORKERS);
        let pool = ThreadPool::new(workers);
        let (tx, rx) = mpsc::channel();

        for (index, station) in self.stations.iter().enumerate() {
            let tx = tx.clone();
            let client = self.client.clone();
            let base_url = self.config.pegelonline_base_url.clone();
            let hours = self.config.hours_back;
            let station = station.clone();

            pool.execute(move || {
                let fetch = fetch_station(&client, &base_url, &station, hours);
                // Receiver outlives the pool; a send error means the run was abandoned.
                let _ = tx.send((index, fetch));
            });
        }
        drop(tx);

        let received: Vec<(usize, StationFetch)> = rx.iter().collect();
        restore_order(&self.stations, received)
    }

    /// Runs the full fetch → chart → analyze → report → deliver sequence once.
    pub fn run_once(&self) -> Result<RunSummary, Box<dyn Error>> {
        let fetches = self.fetch_all();
        let fetched = fetches.iter().filter(|f| f.succeeded()).count();
        logging::log_fetch_summary(fetches.len(), fetched);

        let charts = self.render_charts(&fetches);
        let travel = travel_times(&fetches, &self.config.lag);

        let mut store = match TrendStore::load(&self.config.state_file) {
            Ok(store) => store,
            Err(e) => {
                logging::warn(DataSource::System, None, &format!("{}; starting without trends", e));
                TrendStore::default()
            }
        };
        let lines: Vec<StationLine> = fetches
            .iter()
            .map(|f| station_line(f, &mut store, self.config.trend_threshold_cm))
            .collect();

        let message = report::build_message(self.config.hours_back, &Local::now(), &lines, &travel);

        let delivered = match &self.notifier {
            Some(notifier) => {
                notifier.send_text(&message)?;
                logging::info(
                    DataSource::System,
                    None,
                    &format!("Summary delivered via {}", notifier.channel_name()),
                );
                if self.config.send_charts {
                    self.deliver_charts(notifier.as_ref(), &charts);
                }
                if let Err(e) = store.save(&self.config.state_file) {
                    logging::warn(DataSource::System, None, &e.to_string());
                }
                true
            }
            None => {
                println!("{}", message);
                false
            }
        };

        Ok(RunSummary {
            stations: fetches.len(),
            fetched,
            charts: charts.into_iter().map(|(_, path)| path).collect(),
            travel_times: travel.len(),
            delivered,
            message,
        })
    }

    /// Runs forever, once per `interval`.
    pub fn run(&self, interval: Duration) -> Result<(), Box<dyn Error>> {
        println!("🔄 Starting agent loop...");
        println!("   Interval: {} minutes", interval.as_secs() / 60);
        println!("   Monitoring {} stations", self.stations.len());

        loop {
            let start = Utc::now();

            match self.run_once() {
                Ok(summary) => println!(
                    "✓ Run complete: {}/{} stations, {} travel times, delivered: {}",
                    summary.fetched, summary.stations, summary.travel_times, summary.delivered
                ),
                Err(e) => eprintln!("✗ Run failed: {}", e),
            }

            let elapsed = (Utc::now() - start).num_seconds().max(0) as u64;
            let remaining = interval.as_secs().saturating_sub(elapsed);
            if remaining > 0 {
                std::thread::sleep(Duration::from_secs(remaining));
            }
        }
    }

    fn render_charts(&self, fetches: &[StationFetch]) -> Vec<(String, PathBuf)> {
        let mut charts = Vec::new();
        for (fetch, station) in fetches.iter().zip(&self.stations) {
            let path = chart::chart_path(&self.config.graph_dir, &fetch.name, self.config.hours_back);
            match chart::render_chart(&path, &self.chart_title(station), fetch.history_samples(), self.config.low_line_cm) {
                Ok(()) => {
                    logging::debug(
                        DataSource::Chart,
                        Some(&fetch.name),
                        &format!("{} points → {}", fetch.history_samples().len(), path.display()),
                    );
                    charts.push((self.chart_title(station), path));
                }
                Err(e) => logging::error(DataSource::Chart, Some(&fetch.name), &e.to_string()),
            }
        }
        charts
    }

    fn deliver_charts(&self, notifier: &dyn Notifier, charts: &[(String, PathBuf)]) {
        for (caption, path) in charts {
            if let Err(e) = notifier.send_chart(path, caption) {
                logging::error(DataSource::System, None, &format!("Sending {} failed: {}", path.display(), e));
            }
        }
    }

    fn chart_title(&self, station: &Station) -> String {
        format!(
            "{} – {} – last {} hours",
            station.river.as_deref().unwrap_or("Rhine"),
            station.name,
            self.config.hours_back
        )
    }
}

// ---------------------------------------------------------------------------
// Run steps
// ---------------------------------------------------------------------------

fn fetch_station(client: &Client, base_url: &str, station: &Station, hours: u32) -> StationFetch {
    let current = pegelonline::fetch_current(client, base_url, &station.uuid);
    if let Err(e) = &current {
        logging::log_fetch_failure(&station.name, "current level", e);
    }

    let history = pegelonline::fetch_history(client, base_url, &station.uuid, hours);
    match &history {
        Ok(samples) => logging::debug(
            DataSource::Pegelonline,
            Some(&station.name),
            &format!("{} history points", samples.len()),
        ),
        Err(e) => logging::log_fetch_failure(&station.name, "history", e),
    }

    StationFetch {
        name: station.name.clone(),
        upstream: station.upstream.clone(),
        current,
        history,
    }
}

/// Puts fetch results back in registry order. A station whose worker never
/// reported is listed as failed.
pub fn restore_order(stations: &[Station], received: Vec<(usize, StationFetch)>) -> Vec<StationFetch> {
    let mut slots: Vec<Option<StationFetch>> = stations.iter().map(|_| None).collect();
    for (index, fetch) in received {
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(fetch);
        }
    }

    slots
        .into_iter()
        .zip(stations)
        .map(|(slot, station)| {
            slot.unwrap_or_else(|| StationFetch {
                name: station.name.clone(),
                upstream: station.upstream.clone(),
                current: Err(PegelError::Transport("fetch worker did not report".to_string())),
                history: Err(PegelError::Transport("fetch worker did not report".to_string())),
            })
        })
        .collect()
}

/// Estimates the travel time for every station that names an upstream
/// reference. Pairs without an estimate are logged and left out.
pub fn travel_times(fetches: &[StationFetch], lag: &LagConfig) -> Vec<TravelTime> {
    let mut result = Vec::new();

    for target in fetches {
        let Some(upstream_name) = &target.upstream else {
            continue;
        };
        let Some(upstream) = fetches.iter().find(|f| &f.name == upstream_name) else {
            continue;
        };

        match estimate_lag(upstream.history_samples(), target.history_samples(), lag) {
            LagEstimate::Estimate { lag_steps, correlation } => {
                logging::info(
                    DataSource::Analysis,
                    Some(&target.name),
                    &format!("{} → {}: {} h (r = {:.3})", upstream.name, target.name, lag_steps, correlation),
                );
                result.push(TravelTime {
                    upstream: upstream.name.clone(),
                    target: target.name.clone(),
                    hours: lag_steps,
                });
            }
            LagEstimate::NoEstimate(reason) => logging::debug(
                DataSource::Analysis,
                Some(&target.name),
                &format!("No travel time from {}: {}", upstream.name, reason),
            ),
        }
    }

    result
}

/// Turns a fetch into its report line, recording the current level in the
/// trend store. A failure of either request marks the station as failed.
pub fn station_line(fetch: &StationFetch, store: &mut TrendStore, threshold_cm: f64) -> StationLine {
    if !fetch.succeeded() {
        return StationLine { name: fetch.name.clone(), status: StationStatus::FetchFailed };
    }

    let status = match &fetch.current {
        Err(_) => StationStatus::FetchFailed,
        Ok(None) => StationStatus::NoCurrentValue,
        Ok(Some(current)) => {
            let previous = store.record(&fetch.name, current.value_cm);
            StationStatus::Level {
                value_cm: current.whole_cm(),
                trend: trend::classify(previous, current.value_cm, threshold_cm),
                delta_cm: previous.map(|p| (current.value_cm - p).round() as i64),
            }
        }
    };

    StationLine { name: fetch.name.clone(), status }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
