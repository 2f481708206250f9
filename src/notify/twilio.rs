/// WhatsApp delivery through the Twilio Messages API.
///
/// Twilio fetches media from a public URL rather than accepting uploads,
/// so charts are only sent when the chart directory is published somewhere
/// (`CHART_BASE_URL`). Without it `send_chart` logs and skips.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::{Notifier, NotifyError};
use crate::logging::{self, DataSource};

pub const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Twilio error body (`{"code": 21211, "message": "...", "status": 400}`).
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

pub struct TwilioNotifier {
    client: Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
    chart_base_url: Option<String>,
}

impl TwilioNotifier {
    pub fn new(
        client: Client,
        account_sid: &str,
        auth_token: &str,
        from: &str,
        to: &str,
    ) -> Result<Self, NotifyError> {
        for (value, name) in [
            (account_sid, "TWILIO_ACCOUNT_SID"),
            (auth_token, "TWILIO_AUTH_TOKEN"),
            (from, "TWILIO_WHATSAPP_FROM"),
            (to, "TWILIO_WHATSAPP_TO"),
        ] {
            if value.trim().is_empty() {
                return Err(NotifyError::MissingCredentials(name));
            }
        }

        Ok(Self {
            client,
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            chart_base_url: None,
        })
    }

    pub fn with_chart_base_url(mut self, chart_base_url: Option<String>) -> Self {
        self.chart_base_url = chart_base_url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", TWILIO_API, self.account_sid)
    }

    /// Public URL of a chart file, if charts are published.
    pub fn media_url(&self, path: &Path) -> Option<String> {
        let base = self.chart_base_url.as_ref()?;
        let file_name = path.file_name()?.to_str()?;
        Some(format!("{}/{}", base, urlencoding::encode(file_name)))
    }

    fn post_message(&self, body: &str, media_url: Option<&str>) -> Result<(), NotifyError> {
        let params = message_form(&self.from, &self.to, body, media_url);

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().map_err(|e| NotifyError::Transport(e.to_string()))?;
        check_response(status, &text)
    }
}

/// Form fields for a Messages.json POST.
pub fn message_form(from: &str, to: &str, body: &str, media_url: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("From", from.to_string()),
        ("To", to.to_string()),
        ("Body", body.to_string()),
    ];
    if let Some(url) = media_url {
        params.push(("MediaUrl", url.to_string()));
    }
    params
}

/// 2xx is accepted. An error body with a message is a rejection, anything
/// else is reported by status code.
pub fn check_response(status: u16, body: &str) -> Result<(), NotifyError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => Err(NotifyError::Rejected(match err.code {
            Some(code) => format!("{} (code {})", err.message, code),
            None => err.message,
        })),
        Err(_) => Err(NotifyError::Http(status)),
    }
}

impl Notifier for TwilioNotifier {
    fn channel_name(&self) -> &'static str {
        "whatsapp"
    }

    fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        logging::debug(
            DataSource::WhatsApp,
            None,
            &format!("Messages.json to {} ({} chars)", self.to, text.chars().count()),
        );
        self.post_message(text, None)
    }

    fn send_chart(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        let Some(url) = self.media_url(path) else {
            logging::info(
                DataSource::WhatsApp,
                None,
                &format!("Skipping {}: CHART_BASE_URL is not set", path.display()),
            );
            return Ok(());
        };
        logging::debug(DataSource::WhatsApp, None, &format!("MediaUrl {}", url));
        self.post_message(caption, Some(&url))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> TwilioNotifier {
        TwilioNotifier::new(
            Client::new(),
            "AC123",
            "secret",
            "whatsapp:+14155238886",
            "whatsapp:+31612345678",
        )
        .expect("credentials present")
    }

    #[test]
    fn test_messages_url_contains_account_sid() {
        assert_eq!(
            notifier().messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_form_without_media() {
        let form = message_form("whatsapp:+1", "whatsapp:+31", "hello", None);
        assert_eq!(form.len(), 3);
        assert!(form.iter().all(|(k, _)| *k != "MediaUrl"));
    }

    #[test]
    fn test_form_with_media() {
        let form = message_form("whatsapp:+1", "whatsapp:+31", "BONN", Some("https://x/bonn_48h.svg"));
        assert!(form.contains(&("MediaUrl", "https://x/bonn_48h.svg".to_string())));
    }

    #[test]
    fn test_media_url_requires_base() {
        let path = Path::new("graphs/bonn_48h.svg");
        assert_eq!(notifier().media_url(path), None);

        let published = notifier().with_chart_base_url(Some("https://example.org/graphs/".to_string()));
        assert_eq!(
            published.media_url(path).as_deref(),
            Some("https://example.org/graphs/bonn_48h.svg")
        );
    }

    #[test]
    fn test_chart_is_skipped_without_base_url() {
        // No network: without a base URL nothing is sent.
        assert!(notifier().send_chart(Path::new("graphs/bonn_48h.svg"), "BONN").is_ok());
    }

    #[test]
    fn test_error_body_becomes_rejection() {
        let body = r#"{"code": 21211, "message": "Invalid 'To' Phone Number", "status": 400}"#;
        match check_response(400, body) {
            Err(NotifyError::Rejected(msg)) => {
                assert!(msg.contains("Invalid 'To'"), "got: {}", msg);
                assert!(msg.contains("21211"), "code should be kept: {}", msg);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_created_is_accepted() {
        assert!(check_response(201, r#"{"sid":"SM123","status":"queued"}"#).is_ok());
        assert!(matches!(check_response(503, ""), Err(NotifyError::Http(503))));
    }
}
