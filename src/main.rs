use review_watch::config::Cli;
use review_watch::Config;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::load();
    let _log_guard = review_watch::logging::init(cli.log_dir.as_deref());

    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    review_watch::run(config).await;
    ExitCode::SUCCESS
}
