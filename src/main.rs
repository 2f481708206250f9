//! Rhine water-level agent
//!
//! Fetches current water levels and the recent history for the configured
//! PEGELONLINE stations, renders a chart per station, estimates the travel
//! time of level changes between paired stations and sends a summary to
//! Telegram or WhatsApp.
//!
//! By default it runs once and exits, which is what the scheduled CI job
//! wants. With `--interval` it keeps running.
//!
//! Usage:
//!   cargo run --release                          # One run, deliver summary
//!   cargo run --release -- --dry-run             # One run, print summary only
//!   cargo run --release -- --interval 60         # Run every 60 minutes
//!   cargo run --release -- --stations other.toml # Alternate station registry
//!
//! Environment:
//!   TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID - see .env.example for the full list

use rijnagent::agent::Agent;
use rijnagent::config::AgentConfig;
use rijnagent::logging;
use rijnagent::stations;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

struct CliArgs {
    dry_run: bool,
    stations_file: Option<PathBuf>,
    interval_minutes: Option<u64>,
}

fn usage(program: &str) -> String {
    format!("Usage: {} [--dry-run] [--stations PATH] [--interval MINUTES]", program)
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let program = args.first().map(String::as_str).unwrap_or("rijnagent");
    let mut cli = CliArgs { dry_run: false, stations_file: None, interval_minutes: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dry-run" => {
                cli.dry_run = true;
                i += 1;
            }
            "--stations" => {
                let path = args.get(i + 1).ok_or("--stations requires a path")?;
                cli.stations_file = Some(PathBuf::from(path));
                i += 2;
            }
            "--interval" => {
                let minutes = args
                    .get(i + 1)
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|m| *m > 0)
                    .ok_or("--interval requires a positive number of minutes")?;
                cli.interval_minutes = Some(minutes);
                i += 2;
            }
            "--help" | "-h" => return Err(usage(program)),
            other => return Err(format!("Unknown argument: {}\n{}", other, usage(program))),
        }
    }

    Ok(cli)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(1);
        }
    };

    println!("🌊 Rhine Water-Level Agent");
    println!("==========================\n");

    let mut config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) if cli.dry_run => {
            // Credentials are irrelevant when nothing is delivered.
            eprintln!("⚠ {}\n", e);
            let mut vars: std::collections::HashMap<String, String> = env::vars().collect();
            vars.insert("NOTIFY_CHANNEL".to_string(), "none".to_string());
            match AgentConfig::from_vars(&vars) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n❌ Configuration error: {}\n", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.stations_file {
        config.stations_file = path;
    }
    if !cli.dry_run && !config.delivers() {
        println!("ℹ NOTIFY_CHANNEL=none: the summary is printed, not sent\n");
    }

    logging::init_logger(config.log_level, config.log_file.as_deref(), cli.interval_minutes.is_some());

    println!("📋 Loading stations from {}...", config.stations_file.display());
    let stations = match stations::load_stations(&config.stations_file) {
        Ok(stations) => stations,
        Err(e) => {
            eprintln!("\n❌ {}\n", e);
            std::process::exit(1);
        }
    };
    println!("✓ {} stations\n", stations.len());

    let agent = match Agent::new(config, stations, cli.dry_run) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("\n❌ Initialization failed: {}\n", e);
            std::process::exit(1);
        }
    };

    if let Some(minutes) = cli.interval_minutes {
        println!("   Press Ctrl+C to stop\n");
        if let Err(e) = agent.run(Duration::from_secs(minutes * 60)) {
            eprintln!("\n❌ Agent error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    match agent.run_once() {
        Ok(summary) => {
            println!();
            println!("✓ {}/{} stations fetched", summary.fetched, summary.stations);
            println!("✓ {} travel times estimated", summary.travel_times);
            if summary.delivered {
                println!("✅ Summary delivered");
            } else {
                println!("ℹ Dry run: summary not delivered");
            }
            println!("📁 {} charts written to {}", summary.charts.len(), agent.config().graph_dir.display());
        }
        Err(e) => {
            eprintln!("\n❌ Run failed: {}\n", e);
            std::process::exit(1);
        }
    }
}
