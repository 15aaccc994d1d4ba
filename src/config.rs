use crate::error::ConfigError;
use clap::Parser;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_RETRY_SECS: u64 = 600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Command line / environment surface. Every value can come from either.
#[derive(Parser, Clone)]
#[command(
    name = "review-watch",
    version,
    about = "Watch a homework review and relay status changes to Telegram"
)]
pub struct Cli {
    #[arg(long, env = "PRACTICUM_TOKEN", hide_env_values = true)]
    pub practicum_token: Option<String>,
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,
    #[arg(long, env = "REVIEW_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_TELEGRAM_API_URL)]
    pub telegram_api_url: String,
    #[arg(
        long,
        env = "RETRY_TIME",
        default_value_t = DEFAULT_RETRY_SECS,
        help = "Seconds to rest between poll cycles"
    )]
    pub retry_time: u64,
    #[arg(
        long,
        env = "HTTP_TIMEOUT",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS,
        help = "Per-request timeout in seconds"
    )]
    pub http_timeout: u64,
    #[arg(long, help = "Only report changes made after startup")]
    pub from_now: bool,
    #[arg(
        long,
        env = "LOG_DIR",
        help = "Directory for the daily-rotated log file; stderr only when unset"
    )]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Pull `.env` into the environment, then parse flags and environment.
    pub fn load() -> Self {
        load_env_file(None);
        Self::parse()
    }
}

/// Load `KEY=value` lines from `path`, or from `.env` in the working
/// directory or its parents. Variables already set are left alone.
/// Returns the file that was read.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|()| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Validated configuration, built once at startup and passed by reference.
#[derive(Clone)]
pub struct Config {
    pub endpoint: Url,
    pub practicum_token: String,
    pub telegram_api_url: Url,
    pub telegram_token: String,
    pub chat_id: String,
    pub retry_time: Duration,
    pub http_timeout: Duration,
    pub start_from_now: bool,
}

// Tokens stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint.as_str())
            .field("practicum_token", &"<redacted>")
            .field("telegram_api_url", &self.telegram_api_url.as_str())
            .field("telegram_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("retry_time", &self.retry_time)
            .field("http_timeout", &self.http_timeout)
            .field("start_from_now", &self.start_from_now)
            .finish()
    }
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        Ok(Self {
            practicum_token: required("PRACTICUM_TOKEN", cli.practicum_token)?,
            telegram_token: required("TELEGRAM_TOKEN", cli.telegram_token)?,
            chat_id: required("TELEGRAM_CHAT_ID", cli.telegram_chat_id)?,
            endpoint: parse_url("REVIEW_ENDPOINT", &cli.endpoint)?,
            telegram_api_url: parse_url("TELEGRAM_API_URL", &cli.telegram_api_url)?,
            retry_time: non_zero_secs("RETRY_TIME", cli.retry_time)?,
            http_timeout: non_zero_secs("HTTP_TIMEOUT", cli.http_timeout)?,
            start_from_now: cli.from_now,
        })
    }
}

/// Blank values count as absent.
fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { name })
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn non_zero_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ZeroDuration { name });
    }
    Ok(Duration::from_secs(secs))
}
