/// Message delivery channels.
///
/// The agent talks to a `Notifier` and does not care whether the summary
/// ends up in a Telegram chat or a WhatsApp conversation. Each channel
/// checks its credentials when it is constructed, so a misconfigured job
/// fails before any data is fetched.

pub mod telegram;
pub mod twilio;

use reqwest::blocking::Client;
use std::path::Path;

use crate::config::ChannelConfig;

pub use telegram::TelegramNotifier;
pub use twilio::TwilioNotifier;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum NotifyError {
    /// A credential the channel needs is empty.
    MissingCredentials(&'static str),
    /// Non-2xx response without a usable error body.
    Http(u16),
    /// The request never produced a response.
    Transport(String),
    /// The API answered but refused the message.
    Rejected(String),
    /// A chart file could not be read.
    Io(std::io::Error),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::MissingCredentials(what) => write!(f, "Missing credentials: {}", what),
            NotifyError::Http(code) => write!(f, "HTTP error: {}", code),
            NotifyError::Transport(msg) => write!(f, "Transport error: {}", msg),
            NotifyError::Rejected(msg) => write!(f, "Message rejected: {}", msg),
            NotifyError::Io(e) => write!(f, "Attachment I/O error: {}", e),
        }
    }
}

impl std::error::Error for NotifyError {}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub trait Notifier {
    /// Short channel name for log lines.
    fn channel_name(&self) -> &'static str;

    /// Sends a Markdown text message.
    fn send_text(&self, text: &str) -> Result<(), NotifyError>;

    /// Sends a chart file with a caption. Channels that cannot attach the
    /// file skip it and return `Ok`.
    fn send_chart(&self, path: &Path, caption: &str) -> Result<(), NotifyError>;
}

/// Builds the notifier for `channel`. `Disabled` yields `None`.
pub fn notifier_for(
    channel: &ChannelConfig,
    client: Client,
    chart_base_url: Option<String>,
) -> Result<Option<Box<dyn Notifier>>, NotifyError> {
    let notifier: Box<dyn Notifier> = match channel {
        ChannelConfig::Telegram { bot_token, chat_id } => {
            Box::new(TelegramNotifier::new(client, bot_token, chat_id)?)
        }
        ChannelConfig::WhatsApp { account_sid, auth_token, from, to } => Box::new(
            TwilioNotifier::new(client, account_sid, auth_token, from, to)?
                .with_chart_base_url(chart_base_url),
        ),
        ChannelConfig::Disabled => return Ok(None),
    };
    Ok(Some(notifier))
}
