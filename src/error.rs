use std::fmt;

/// Where a failed request was aimed. Carried by fetch failures for diagnostics.
///
/// Holds no credentials, so the rendered text is safe to relay to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub endpoint: String,
    pub from_date: i64,
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint: {}, from_date: {}", self.endpoint, self.from_date)
    }
}

/// Failures of one poll cycle. The `Display` text is what gets relayed to the chat.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("API request failed: {cause}. {context}")]
    Transport {
        cause: String,
        context: RequestContext,
    },
    #[error("API returned status {code}. {context}")]
    UnexpectedStatus { code: u16, context: RequestContext },
    #[error(
        "API denied the request{}: {marker}={value}. {context}",
        .status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
    )]
    ServiceDenied {
        /// Set when the refusal came with a non-200 status.
        status: Option<u16>,
        marker: String,
        value: String,
        context: RequestContext,
    },
    #[error("API returned a body that is not JSON: {cause}. {context}")]
    MalformedBody {
        cause: String,
        context: RequestContext,
    },
    #[error("Unexpected response type. Expected: {expected}. Received: {actual}")]
    SchemaType {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Missing required key. Expected: '{key}'. Present: [{}]", .present.join(", "))]
    SchemaKey {
        key: &'static str,
        present: Vec<String>,
    },
    #[error("Unknown review status. Expected one of: [{}]. Received: {status}", .valid.join(", "))]
    UnknownStatus {
        status: String,
        valid: Vec<&'static str>,
    },
}

/// Discriminant of [`WatchError`], for branching without matching on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    UnexpectedStatus,
    ServiceDenied,
    MalformedBody,
    SchemaType,
    SchemaKey,
    UnknownStatus,
}

impl WatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WatchError::Transport { .. } => FailureKind::Transport,
            WatchError::UnexpectedStatus { .. } => FailureKind::UnexpectedStatus,
            WatchError::ServiceDenied { .. } => FailureKind::ServiceDenied,
            WatchError::MalformedBody { .. } => FailureKind::MalformedBody,
            WatchError::SchemaType { .. } => FailureKind::SchemaType,
            WatchError::SchemaKey { .. } => FailureKind::SchemaKey,
            WatchError::UnknownStatus { .. } => FailureKind::UnknownStatus,
        }
    }
}

/// The messaging channel could not complete a send.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Telegram request failed: {0}")]
    Transport(String),
    #[error("Telegram rejected the message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Startup configuration problems. Fatal: the loop never starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration value: {name}")]
    Missing { name: &'static str },
    #[error("Invalid URL in {name} ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },
}
