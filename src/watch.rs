use crate::config::Config;
use crate::error::{FailureKind, WatchError};
use crate::notifier::{Delivery, Messenger, NotificationGate, TelegramBot};
use crate::review_api::{ReviewApiClient, StatusSource};
use crate::validator::check_response;
use crate::verdict::parse_status;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Payload key holding the server's refreshed cursor.
pub const CURSOR_KEY: &str = "current_date";

/// Result of one poll cycle, as seen from outside the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A record came back and its verdict was offered to the gate.
    Notified { message: String, delivery: Delivery },
    /// Valid answer with no records.
    NoChanges,
    /// A stage failed; its diagnostic was offered to the gate instead.
    Failed { kind: FailureKind, delivery: Delivery },
}

/// What a successful poll produced.
struct Poll {
    message: Option<String>,
    refreshed: Option<i64>,
}

/// Poll → validate → extract → notify, forever.
///
/// Owns the cursor and (through the gate) the last delivered message. The
/// cursor moves forward only after a cycle that succeeded end to end, so a
/// failed cycle re-queries the same window next time.
pub struct Watcher<S, M> {
    source: S,
    gate: NotificationGate<M>,
    cursor: i64,
    interval: Duration,
}

impl Watcher<ReviewApiClient, TelegramBot> {
    pub fn from_config(config: &Config) -> Self {
        let gate = NotificationGate::new(TelegramBot::from_config(config), config.chat_id.clone());
        Self::new(
            ReviewApiClient::from_config(config),
            gate,
            initial_cursor(config.start_from_now),
            config.retry_time,
        )
    }
}

impl<S: StatusSource, M: Messenger> Watcher<S, M> {
    pub fn new(source: S, gate: NotificationGate<M>, cursor: i64, interval: Duration) -> Self {
        Self {
            source,
            gate,
            cursor: cursor.max(0),
            interval,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    #[cfg(test)]
    pub(crate) fn gate(&self) -> &NotificationGate<M> {
        &self.gate
    }

    async fn poll(&self) -> Result<Poll, WatchError> {
        let payload = self.source.fetch(self.cursor).await?;
        let records = check_response(&payload)?;

        // Only the newest record matters.
        let message = match records.first() {
            Some(record) => Some(parse_status(record)?),
            None => None,
        };

        Ok(Poll {
            message,
            refreshed: refreshed_cursor(&payload),
        })
    }

    /// Run one cycle. Never fails: errors become gated diagnostics.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        match self.poll().await {
            Ok(Poll {
                message: Some(message),
                refreshed,
            }) => {
                let delivery = self.gate.offer(&message).await;
                // An undelivered verdict must be fetched again.
                if delivery != Delivery::Failed {
                    self.advance(refreshed);
                }
                CycleOutcome::Notified { message, delivery }
            }
            Ok(Poll {
                message: None,
                refreshed,
            }) => {
                self.advance(refreshed);
                CycleOutcome::NoChanges
            }
            Err(e) => {
                error!("Poll cycle failed: {e}");
                let delivery = self.gate.offer(&e.to_string()).await;
                CycleOutcome::Failed {
                    kind: e.kind(),
                    delivery,
                }
            }
        }
    }

    fn advance(&mut self, refreshed: Option<i64>) {
        if let Some(next) = refreshed {
            if next > self.cursor {
                info!(
                    "Cursor advanced from {} to {}",
                    format_cursor(self.cursor),
                    format_cursor(next)
                );
                self.cursor = next;
            }
        }
    }

    /// Cycle, rest for the fixed interval, repeat until `shutdown` resolves.
    ///
    /// The interval is the same after success and failure. Returns the watcher
    /// so its final state can be inspected.
    pub async fn run<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        info!(
            "Watching review status since {} every {}s",
            format_cursor(self.cursor),
            self.interval.as_secs()
        );

        tokio::pin!(shutdown);
        loop {
            let stop = tokio::select! {
                _ = &mut shutdown => true,
                _ = self.cycle_then_rest() => false,
            };
            if stop {
                info!("Shutdown requested, stopping watcher");
                return self;
            }
        }
    }

    async fn cycle_then_rest(&mut self) {
        self.run_cycle().await;
        tokio::time::sleep(self.interval).await;
    }
}

/// The server's refreshed cursor, if it sent a usable one.
pub fn refreshed_cursor(payload: &Value) -> Option<i64> {
    payload.get(CURSOR_KEY).and_then(Value::as_i64)
}

/// 0 reports the whole history; `from_now` only what changes after startup.
pub fn initial_cursor(from_now: bool) -> i64 {
    if from_now {
        chrono::Utc::now().timestamp()
    } else {
        0
    }
}

/// Render a cursor as RFC 3339 for logs.
fn format_cursor(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
