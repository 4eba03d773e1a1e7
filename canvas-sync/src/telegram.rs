//! Chat notifier: implements the core `Notifier` trait with the Telegram Bot API.
//!
//! Messages go out as plain text unless a parse mode is configured, in which
//! case the text is escaped for it first.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use canvas_sync_core::contract::Notifier;
use canvas_sync_core::errors::NotifyError;
use canvas_sync_core::format::escape_markdown_v2;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
    pub parse_mode: Option<ParseMode>,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("parse_mode", &self.parse_mode)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    http: Client,
    api_url: String,
    settings: TelegramSettings,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings, timeout: Duration) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(timeout).build()?;
        tracing::info!(
            chat_id = %settings.chat_id,
            parse_mode = ?settings.parse_mode,
            "Initialised Telegram notifier"
        );
        Ok(TelegramNotifier {
            http,
            api_url: TELEGRAM_API_URL.to_string(),
            settings,
        })
    }

    pub fn message<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        let text = match self.settings.parse_mode {
            Some(ParseMode::MarkdownV2) => Cow::Owned(escape_markdown_v2(text)),
            None => Cow::Borrowed(text),
        };
        SendMessage {
            chat_id: &self.settings.chat_id,
            text,
            parse_mode: self.settings.parse_mode,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        // The URL embeds the bot token; never log it.
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.settings.bot_token);
        let resp = self.http.post(url).json(&self.message(text)).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        match serde_json::from_str::<BotResponse>(&body) {
            Ok(BotResponse { ok: true, .. }) => Ok(()),
            Ok(BotResponse { description, .. }) => Err(NotifyError::Rejected {
                description: description.unwrap_or_else(|| "no description".into()),
            }),
            Err(e) => Err(NotifyError::Rejected {
                description: format!("unreadable response: {e}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notifier(parse_mode: Option<ParseMode>) -> TelegramNotifier {
        TelegramNotifier::new(
            TelegramSettings {
                bot_token: "123:abc".into(),
                chat_id: "-100200".into(),
                parse_mode,
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn plain_text_body_has_no_parse_mode() {
        let n = notifier(None);
        let body = serde_json::to_value(n.message("New file\nName: a_b.pdf")).unwrap();
        assert_eq!(
            body,
            json!({ "chat_id": "-100200", "text": "New file\nName: a_b.pdf" })
        );
    }

    #[test]
    fn markdown_mode_escapes_text() {
        let n = notifier(Some(ParseMode::MarkdownV2));
        let body = serde_json::to_value(n.message("a_b.pdf")).unwrap();
        assert_eq!(body["text"], "a\\_b\\.pdf");
        assert_eq!(body["parse_mode"], "MarkdownV2");
    }
}
