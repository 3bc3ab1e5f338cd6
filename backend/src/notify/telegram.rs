use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::TelegramConfig;
use crate::notify::{DeliveryError, Notifier};

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage` client bound to one chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(cfg: &TelegramConfig) -> Result<Self, DeliveryError> {
        let http = Client::builder().timeout(cfg.timeout).build()?;

        Ok(Self {
            http,
            url: format!("{}/bot{}/sendMessage", cfg.base_url, cfg.token),
            chat_id: cfg.chat_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip_all, fields(chat_id = %self.chat_id, len = text.len()), level = "debug")]
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            // the request url embeds the bot token
            .map_err(reqwest::Error::without_url)?;

        let status = resp.status();
        let body: SendMessageResponse = resp.json().await.map_err(|e| {
            if status.is_success() {
                DeliveryError::Http(e.without_url())
            } else {
                DeliveryError::Rejected(format!("status {status}"))
            }
        })?;

        if !body.ok {
            return Err(DeliveryError::Rejected(
                body.description
                    .unwrap_or_else(|| format!("status {status}")),
            ));
        }

        debug!("telegram message delivered");
        Ok(())
    }
}
