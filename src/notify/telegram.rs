/// Telegram Bot API delivery.
///
/// Text goes through `sendMessage` with Markdown parsing and link previews
/// off. Charts are SVG, which `sendPhoto` does not accept, so they are
/// uploaded as documents with `sendDocument`.

use reqwest::blocking::{multipart, Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use super::{Notifier, NotifyError};
use crate::logging::{self, DataSource};

pub const TELEGRAM_API: &str = "https://api.telegram.org";

const TEXT_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Every Bot API response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, bot_token: &str, chat_id: &str) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("TELEGRAM_BOT_TOKEN"));
        }
        if chat_id.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("TELEGRAM_CHAT_ID"));
        }
        Ok(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    /// Points the notifier at another Bot API server.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

/// JSON body for `sendMessage`.
pub fn message_payload(chat_id: &str, text: &str) -> serde_json::Value {
    json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "Markdown",
        "disable_web_page_preview": true,
    })
}

/// Interprets a Bot API response. `ok: false` is a rejection even when the
/// HTTP status is 2xx; the description is passed through.
pub fn check_response(status: u16, body: &str) -> Result<(), NotifyError> {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(resp) if resp.ok => Ok(()),
        Ok(resp) => Err(NotifyError::Rejected(
            resp.description.unwrap_or_else(|| format!("status {}", status)),
        )),
        Err(_) if !(200..300).contains(&status) => Err(NotifyError::Http(status)),
        Err(e) => Err(NotifyError::Rejected(format!("unreadable response: {}", e))),
    }
}

fn read_response(response: Response) -> Result<(), NotifyError> {
    let status = response.status().as_u16();
    let body = response.text().map_err(|e| NotifyError::Transport(e.to_string()))?;
    check_response(status, &body)
}

impl Notifier for TelegramNotifier {
    fn channel_name(&self) -> &'static str {
        "telegram"
    }

    fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        logging::debug(
            DataSource::Telegram,
            None,
            &format!("sendMessage to chat {} ({} chars)", self.chat_id, text.chars().count()),
        );

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&message_payload(&self.chat_id, text))
            .timeout(TEXT_TIMEOUT)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        read_response(response)
    }

    fn send_chart(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        logging::debug(
            DataSource::Telegram,
            None,
            &format!("sendDocument {}", path.display()),
        );

        let form = multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .file("document", path)
            .map_err(NotifyError::Io)?;

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        read_response(response)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
