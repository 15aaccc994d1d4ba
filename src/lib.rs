pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod review_api;
pub mod validator;
pub mod verdict;
pub mod watch;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{ConfigError, DeliveryError, FailureKind, WatchError};
pub use notifier::{Delivery, Messenger, NotificationGate, TelegramBot};
pub use review_api::{ReviewApiClient, StatusSource};
pub use watch::{CycleOutcome, Watcher};

/// Watch until Ctrl-C. Configuration must already be validated.
pub async fn run(config: Config) {
    tracing::debug!("Starting with {config:?}");
    Watcher::from_config(&config).run(shutdown_signal()).await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the only way out is killing the process.
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
