//! Single-product matching engine daemon.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matcher_server::config::Config;
use matcher_server::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matcher_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env_and_args()?;
    info!(
        product = %config.product,
        log_dir = %config.log_dir.display(),
        "starting matcher"
    );

    server::run(config).await
}
