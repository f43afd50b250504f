//! Outbound chat notifications.
//!
//! Messages go to a Telegram-style bot API when credentials are configured,
//! otherwise they are written to the log and treated as delivered.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::TelegramCredentials;
use crate::error::{AppError, Result};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one text message. Delivery failures surface as `AppError::Notify`.
    async fn send(&self, text: &str) -> Result<()>;
}

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    credentials: Option<TelegramCredentials>,
}

impl TelegramNotifier {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        credentials: Option<TelegramCredentials>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            credentials,
        }
    }

    /// Notifier that never leaves the process.
    pub fn log_only() -> Self {
        Self::new(reqwest::Client::new(), String::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    fn endpoint(&self, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_url.trim_end_matches('/'), bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let Some(creds) = &self.credentials else {
            info!("[Notify] bot token not configured, message logged only:\n{text}");
            return Ok(());
        };

        let payload = SendMessage {
            chat_id: &creds.chat_id,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(self.endpoint(&creds.bot_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "[Notify] bot API returned error");
            return Err(AppError::Notify(format!("bot API error: {status} - {body}")));
        }

        info!("[Notify] message delivered ({} chars)", text.chars().count());
        Ok(())
    }
}

/// Human-readable failure report sent by [`report_error`].
pub fn error_report_text(context: &str, err: &AppError) -> String {
    format!("Ticket monitor check failed\n- {context}\n- {err}")
}

/// Log a caught fault and try to tell the channel about it. A failure to
/// deliver the report is logged and dropped.
pub async fn report_error(notifier: &dyn Notifier, context: &str, err: &AppError) {
    error!("[ERROR] {context}: {err}");
    if let Err(e) = notifier.send(&error_report_text(context, err)).await {
        warn!("[Notify] error report not delivered: {e}");
    }
}
