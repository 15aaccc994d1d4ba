use crate::config::Config;
use crate::error::{RequestContext, WatchError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Top-level keys the API uses instead of the normal schema when it refuses a request.
pub const DENIAL_MARKERS: [&str; 2] = ["code", "error"];

/// Anything that can answer "what changed since `from_date`".
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, from_date: i64) -> Result<Value, WatchError>;
}

/// REST client for the homework review-status endpoint
pub struct ReviewApiClient {
    endpoint: Url,
    token: String,
    http: Client,
}

impl ReviewApiClient {
    pub fn new(endpoint: Url, token: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            token,
            http: http_client(timeout),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.practicum_token.clone(),
            config.http_timeout,
        )
    }

    fn context(&self, from_date: i64) -> RequestContext {
        RequestContext {
            endpoint: self.endpoint.to_string(),
            from_date,
        }
    }

    /// Query review statuses changed since `from_date`.
    ///
    /// Returns the decoded body untouched; shape checks belong to the validator.
    /// Nothing is retried here.
    pub async fn get_api_answer(&self, from_date: i64) -> Result<Value, WatchError> {
        let resp = self
            .http
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| WatchError::Transport {
                cause: describe_transport(&e),
                context: self.context(from_date),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| WatchError::Transport {
            cause: describe_transport(&e),
            context: self.context(from_date),
        })?;

        if status != StatusCode::OK {
            // Refusals usually arrive with a 4xx; prefer the service's own reason.
            if let Ok(payload) = serde_json::from_str::<Value>(&body) {
                if let Some(err) =
                    denial(&payload, Some(status.as_u16()), self.context(from_date))
                {
                    return Err(err);
                }
            }
            return Err(WatchError::UnexpectedStatus {
                code: status.as_u16(),
                context: self.context(from_date),
            });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| WatchError::MalformedBody {
                cause: e.to_string(),
                context: self.context(from_date),
            })?;
        debug!(from_date, "Fetched payload: {payload}");

        if let Some(err) = denial(&payload, None, self.context(from_date)) {
            return Err(err);
        }

        Ok(payload)
    }
}

#[async_trait]
impl StatusSource for ReviewApiClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, WatchError> {
        self.get_api_answer(from_date).await
    }
}

/// Detect a refusal body: a mapping carrying one of [`DENIAL_MARKERS`].
fn denial(payload: &Value, status: Option<u16>, context: RequestContext) -> Option<WatchError> {
    let map = payload.as_object()?;
    let (marker, value) = DENIAL_MARKERS
        .iter()
        .find_map(|m| map.get(*m).map(|v| (*m, v)))?;

    let mut value = render(value);
    if let Some(message) = map.get("message").and_then(Value::as_str) {
        value.push_str(&format!(" ({message})"));
    }

    Some(WatchError::ServiceDenied {
        status,
        marker: marker.to_string(),
        value,
        context,
    })
}

/// Client with the configured per-request timeout. Falls back to reqwest's
/// defaults (no timeout) if the builder fails.
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!("Failed to build HTTP client with {timeout:?} timeout, using defaults: {e}");
        Client::new()
    })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a reqwest error and its sources into one line.
fn describe_transport(err: &reqwest::Error) -> String {
    let mut text = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        "request error".to_string()
    };

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    text
}
