//! Ad-hoc travel-time estimate between two stations.
//!
//! Fetches the recent history of both stations and reports how many hours
//! level changes at UPSTREAM take to show up at TARGET. Station arguments
//! are registry names (`BONN`) or PEGELONLINE UUIDs/shortnames.
//!
//! Usage:
//!   cargo run --bin travel_time -- BONN KÖLN
//!   cargo run --bin travel_time -- BONN DÜSSELDORF --hours 96 --max-lag 24

use rijnagent::analysis::lag::{estimate_lag, LagConfig, LagEstimate};
use rijnagent::ingest::pegelonline::{self, DEFAULT_BASE_URL};
use rijnagent::logging::{self, LogLevel};
use rijnagent::stations::{self, DEFAULT_STATIONS_FILE};
use std::env;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args: Vec<String> = env::args().collect();

    let mut positional = Vec::new();
    let mut hours: u32 = 48;
    let mut max_lag: usize = LagConfig::default().max_lag_steps;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--hours" => {
                hours = args.get(i + 1).ok_or("--hours requires a number")?.parse()?;
                i += 2;
            }
            "--max-lag" => {
                max_lag = args.get(i + 1).ok_or("--max-lag requires a number")?.parse()?;
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    if positional.len() != 2 || hours == 0 {
        eprintln!("Usage: {} UPSTREAM TARGET [--hours N] [--max-lag N]", args[0]);
        std::process::exit(1);
    }

    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LogLevel::Info);
    logging::init_logger(level, None, false);

    // Registry is optional here; unknown names are passed to the API as-is.
    let registry_path = env::var("STATIONS_FILE").unwrap_or_else(|_| DEFAULT_STATIONS_FILE.to_string());
    let registry = stations::load_stations(&registry_path).unwrap_or_default();
    let resolve = |name: &str| {
        stations::find_station(&registry, name)
            .map(|s| s.uuid.clone())
            .unwrap_or_else(|| name.to_string())
    };

    let base_url = env::var("PEGELONLINE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let (upstream, target) = (&positional[0], &positional[1]);
    println!("⏱ Travel time {} → {} (last {} h, max lag {} h)\n", upstream, target, hours, max_lag);

    let reference = pegelonline::fetch_history(&client, &base_url, &resolve(upstream), hours)?;
    println!("   {}: {} points", upstream, reference.len());
    let delayed = pegelonline::fetch_history(&client, &base_url, &resolve(target), hours)?;
    println!("   {}: {} points\n", target, delayed.len());

    let config = LagConfig::with_max_lag_steps(max_lag);
    match estimate_lag(&reference, &delayed, &config) {
        LagEstimate::Estimate { lag_steps, correlation } => {
            println!("✓ {} → {}: ≈ {} h (r = {:.3})", upstream, target, lag_steps, correlation);
        }
        LagEstimate::NoEstimate(reason) => {
            println!("✗ No estimate: {}", reason);
        }
    }

    Ok(())
}
