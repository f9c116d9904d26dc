//! Hifz bot binary.

use anyhow::Result;
use clap::Parser;
use hifz_bot::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level);
    config.validate().map_err(anyhow::Error::msg)?;

    info!(
        "Starting hifz-bot {} (progress file {})",
        env!("CARGO_PKG_VERSION"),
        config.progress_file.display()
    );
    hifz_bot::run(config).await
}
