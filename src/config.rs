/// Agent configuration from environment variables.
///
/// Secrets (bot tokens, Twilio credentials) come from the environment, set
/// as CI secrets or in a local `.env` file. Everything else has a default
/// that reproduces the scheduled Rhine job: three stations, last 48 hours,
/// a 200 cm guide line, Telegram delivery.
///
/// Parsing works on a plain variable map so it can be tested without
/// touching the process environment.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::analysis::lag::LagConfig;
use crate::ingest::pegelonline::DEFAULT_BASE_URL;
use crate::logging::LogLevel;
use crate::stations::DEFAULT_STATIONS_FILE;

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Where the summary message is delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    Telegram {
        bot_token: String,
        chat_id: String,
    },
    WhatsApp {
        account_sid: String,
        auth_token: String,
        /// Sender, e.g. `whatsapp:+14155238886`.
        from: String,
        /// Recipient, e.g. `whatsapp:+31612345678`.
        to: String,
    },
    /// Print only; used for dry runs and local development.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub channel: ChannelConfig,

    /// PEGELONLINE API root (default: the official v2 endpoint).
    pub pegelonline_base_url: String,

    /// Look-back window for history and charts (default: 48 hours).
    pub hours_back: u32,

    /// Height of the low-water guide line on charts (default: 200 cm).
    pub low_line_cm: f64,

    /// Output directory for chart files (default: `graphs`).
    pub graph_dir: PathBuf,

    /// Station registry (default: `stations.toml`).
    pub stations_file: PathBuf,

    /// Last-value store used for trend arrows (default: `last_values.json`).
    pub state_file: PathBuf,

    /// Also deliver the chart files after the text message (default: false).
    pub send_charts: bool,

    /// Public URL prefix under which chart files are published. WhatsApp
    /// can only attach media by URL, so it sends charts only when set.
    pub chart_base_url: Option<String>,

    /// Minimum change in cm before a trend arrow shows rising/falling (default: 2).
    pub trend_threshold_cm: f64,

    /// Travel-time search parameters.
    pub lag: LagConfig,

    pub log_level: LogLevel,
    pub log_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A channel was selected but one of its credentials is not set.
    MissingVariable { channel: &'static str, variable: &'static str },
    /// A variable is set but cannot be parsed.
    InvalidValue { variable: &'static str, value: String, expected: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable { channel, variable } => {
                write!(f, "{} is not set but NOTIFY_CHANNEL is '{}'.\n\n", variable, channel)?;
                write!(f, "  Set it as a repository secret for the scheduled workflow,\n")?;
                write!(f, "  or add it to .env for local runs (see .env.example).\n")?;
                write!(f, "  Use NOTIFY_CHANNEL=none or --dry-run to skip delivery.")
            }
            ConfigError::InvalidValue { variable, value, expected } => {
                write!(f, "Invalid value for {}: '{}' (expected {})", variable, value, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AgentConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Builds the configuration from a variable map. Empty values count as unset.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let channel = match get("NOTIFY_CHANNEL").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("telegram") => ChannelConfig::Telegram {
                bot_token: require(&get, "telegram", "TELEGRAM_BOT_TOKEN")?,
                chat_id: require(&get, "telegram", "TELEGRAM_CHAT_ID")?,
            },
            Some("whatsapp") => ChannelConfig::WhatsApp {
                account_sid: require(&get, "whatsapp", "TWILIO_ACCOUNT_SID")?,
                auth_token: require(&get, "whatsapp", "TWILIO_AUTH_TOKEN")?,
                from: whatsapp_address(require(&get, "whatsapp", "TWILIO_WHATSAPP_FROM")?),
                to: whatsapp_address(require(&get, "whatsapp", "TWILIO_WHATSAPP_TO")?),
            },
            Some("none") | Some("disabled") => ChannelConfig::Disabled,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    variable: "NOTIFY_CHANNEL",
                    value: other.to_string(),
                    expected: "telegram, whatsapp or none",
                });
            }
        };

        let hours_back: u32 = parse_or(&get, "HOURS_BACK", 48, "a whole number of hours")?;
        if hours_back == 0 {
            return Err(ConfigError::InvalidValue {
                variable: "HOURS_BACK",
                value: "0".to_string(),
                expected: "a positive number of hours",
            });
        }

        let max_lag_hours: usize = parse_or(&get, "LAG_MAX_HOURS", 72, "a whole number of hours")?;

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => raw.parse::<LogLevel>().map_err(|_| ConfigError::InvalidValue {
                variable: "LOG_LEVEL",
                value: raw.clone(),
                expected: "debug, info, warn or error",
            })?,
            None => LogLevel::Info,
        };

        Ok(Self {
            channel,
            pegelonline_base_url: get("PEGELONLINE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            hours_back,
            low_line_cm: parse_or(&get, "LOW_LINE_CM", 200.0, "a number of centimeters")?,
            graph_dir: PathBuf::from(get("GRAPH_DIR").unwrap_or_else(|| "graphs".to_string())),
            stations_file: PathBuf::from(
                get("STATIONS_FILE").unwrap_or_else(|| DEFAULT_STATIONS_FILE.to_string()),
            ),
            state_file: PathBuf::from(
                get("STATE_FILE").unwrap_or_else(|| "last_values.json".to_string()),
            ),
            send_charts: parse_bool(&get, "SEND_CHARTS")?,
            chart_base_url: get("CHART_BASE_URL"),
            trend_threshold_cm: parse_or(&get, "TREND_THRESHOLD_CM", 2.0, "a number of centimeters")?,
            lag: LagConfig::with_max_lag_steps(max_lag_hours),
            log_level,
            log_file: get("LOG_FILE"),
        })
    }

    /// Whether a message will actually leave the machine.
    pub fn delivers(&self) -> bool {
        self.channel != ChannelConfig::Disabled
    }
}

fn require(
    get: &impl Fn(&str) -> Option<String>,
    channel: &'static str,
    variable: &'static str,
) -> Result<String, ConfigError> {
    get(variable).ok_or(ConfigError::MissingVariable { channel, variable })
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match get(variable) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            variable,
            value: raw,
            expected,
        }),
        None => Ok(default),
    }
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
) -> Result<bool, ConfigError> {
    match get(variable).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue {
            variable,
            value: other.to_string(),
            expected: "true or false",
        }),
    }
}

/// Twilio wants WhatsApp numbers prefixed with `whatsapp:`.
fn whatsapp_address(number: String) -> String {
    if number.starts_with("whatsapp:") {
        number
    } else {
        format!("whatsapp:{}", number)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
