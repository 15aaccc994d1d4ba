use crate::config::Config;
use crate::error::DeliveryError;
use crate::review_api::http_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// Outbound text channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Telegram Bot API client (sendMessage only)
pub struct TelegramBot {
    api_base: String,
    token: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramBot {
    pub fn new(api_base: &Url, token: String, timeout: Duration) -> Self {
        Self {
            api_base: api_base.as_str().trim_end_matches('/').to_string(),
            token,
            http: http_client(timeout),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.telegram_api_url,
            config.telegram_token.clone(),
            config.http_timeout,
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[async_trait]
impl Messenger for TelegramBot {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        // The bot token is part of the URL, so errors are stripped of it.
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<TelegramResponse>(&body).ok();

        match parsed {
            Some(TelegramResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(TelegramResponse { description, .. }) => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description: body.chars().take(200).collect(),
            }),
        }
    }
}

/// What the gate did with a candidate message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Same text as the last delivered message; the channel was not called.
    Suppressed,
    /// The channel failed. Logged and swallowed.
    Failed,
}

/// Deduplicating front for a [`Messenger`].
///
/// Remembers the last text that actually reached the chat and drops a candidate
/// identical to it. A failed send leaves that memory untouched, so the same text
/// is retried the next time it comes up.
pub struct NotificationGate<M> {
    messenger: M,
    chat_id: String,
    last_delivered: Option<String>,
}

impl<M: Messenger> NotificationGate<M> {
    pub fn new(messenger: M, chat_id: String) -> Self {
        Self {
            messenger,
            chat_id,
            last_delivered: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn last_delivered(&self) -> Option<&str> {
        self.last_delivered.as_deref()
    }

    pub async fn offer(&mut self, text: &str) -> Delivery {
        if self.last_delivered.as_deref() == Some(text) {
            debug!("Suppressed duplicate message: {text}");
            return Delivery::Suppressed;
        }

        match self.messenger.send_message(&self.chat_id, text).await {
            Ok(()) => {
                info!("Sent message: {text}");
                self.last_delivered = Some(text.to_string());
                Delivery::Sent
            }
            Err(e) => {
                error!("Failed to send message: {e}");
                Delivery::Failed
            }
        }
    }
}
