use crate::config::TelegramSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Best-effort delivery of a run summary.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns whether the message was accepted. Never fails.
    async fn send(&self, text: &str) -> bool;
}

/// Sends messages through the Telegram Bot API `sendMessage` method
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, token: Option<String>, chat_id: Option<String>) -> Self {
        // building only fails when the TLS backend can't initialise
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            chat_id,
        }
    }

    /// Build from settings, letting `TELEGRAM_TOKEN` / `TELEGRAM_CHAT_ID` override them.
    pub fn from_settings(settings: &TelegramSettings) -> Self {
        let credentials = settings.credentials();
        Self::new(&settings.api_base, credentials.token, credentials.chat_id)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> bool {
        let (Some(token), Some(chat_id)) = (&self.token, &self.chat_id) else {
            warn!("Telegram token or chat id missing, skipping notification");
            return false;
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let payload = json!({ "chat_id": chat_id, "text": text });

        match self.client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("📨 Telegram notification sent");
                true
            }
            Ok(response) => {
                warn!("Telegram returned status: {}", response.status());
                false
            }
            Err(e) => {
                debug!("Telegram request error: {}", e);
                warn!("Failed to send Telegram notification");
                false
            }
        }
    }
}
