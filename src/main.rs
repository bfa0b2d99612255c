//! telebridge - Main entry point.

use anyhow::Result;
use telebridge::config::Config;
use telebridge::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("BOT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_logging(&log_level);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Missing credentials: log and refuse to serve
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    tracing::info!("telebridge v{}", env!("CARGO_PKG_VERSION"));

    telebridge::run(config).await
}
