//! Switchboard server entry point.

use clap::Parser;
use switchboard::config::{Config, LogFormat};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }

    if let Err(e) = switchboard::app::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
