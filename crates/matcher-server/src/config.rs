//! Configuration for the engine process.
//!
//! Defaults come from the environment, CLI flags win:
//!
//! - `MATCHER_PRODUCT`     / `--product`      (default: "BTCUSD")
//! - `MATCHER_CLIENT_IP`   / `--client-ip`    (default: "0.0.0.0")
//! - `MATCHER_CLIENT_PORT` / `--client-port`  (default: 7700)
//! - `MATCHER_FEED_IP`     / `--feed-ip`      (default: "239.255.0.100")
//! - `MATCHER_FEED_PORT`   / `--feed-port`    (default: 7701)
//! - `MATCHER_LOG_DIR`     / `--log-dir`      (default: "logs")
//! - `MATCHER_NO_RECOVER`  / `--no-recover`   (default: false)
//! - `MATCHER_MAX_CLIENTS` / `--max-clients`  (default: 1024)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;

/// Engine process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single product this instance serves.
    pub product: String,

    /// Inbound client listener.
    pub client_ip: String,
    pub client_port: u16,

    /// Multicast feed target.
    pub feed_ip: String,
    pub feed_port: u16,

    /// Directory holding journals and snapshots.
    pub log_dir: PathBuf,

    /// Skip snapshot load and journal replay on startup. Intended for the
    /// first cold boot of a new product, not for restarts.
    pub no_recover: bool,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,
}

#[derive(Parser, Debug)]
#[clap(name = "matcher")]
#[clap(about = "Single-product order-matching engine")]
struct Cli {
    /// Product identifier
    #[clap(long)]
    product: Option<String>,

    /// Client listener address
    #[clap(long)]
    client_ip: Option<String>,

    /// Client listener port
    #[clap(long)]
    client_port: Option<u16>,

    /// Multicast feed address
    #[clap(long)]
    feed_ip: Option<String>,

    /// Multicast feed port
    #[clap(long)]
    feed_port: Option<u16>,

    /// Journal and snapshot directory
    #[clap(long)]
    log_dir: Option<PathBuf>,

    /// Skip recovery on startup (fresh cold boot)
    #[clap(long, action = clap::ArgAction::SetTrue)]
    no_recover: bool,

    /// Maximum simultaneous client connections
    #[clap(long)]
    max_clients: Option<usize>,
}

impl Config {
    /// Construct from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            product: env::var("MATCHER_PRODUCT").unwrap_or_else(|_| "BTCUSD".to_string()),
            client_ip: env::var("MATCHER_CLIENT_IP").unwrap_or_else(|_| "0.0.0.0".to_string()),
            client_port: read_env_or_default("MATCHER_CLIENT_PORT", 7700u16)?,
            feed_ip: env::var("MATCHER_FEED_IP").unwrap_or_else(|_| "239.255.0.100".to_string()),
            feed_port: read_env_or_default("MATCHER_FEED_PORT", 7701u16)?,
            log_dir: env::var("MATCHER_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
            no_recover: read_env_or_default("MATCHER_NO_RECOVER", false)?,
            max_clients: read_env_or_default("MATCHER_MAX_CLIENTS", 1024usize)?,
        })
    }

    /// Environment config with CLI overrides applied on top.
    pub fn from_env_and_args() -> Result<Self> {
        let cli = Cli::parse();
        let mut config = Config::from_env()?;

        if let Some(product) = cli.product {
            config.product = product;
        }
        if let Some(client_ip) = cli.client_ip {
            config.client_ip = client_ip;
        }
        if let Some(client_port) = cli.client_port {
            config.client_port = client_port;
        }
        if let Some(feed_ip) = cli.feed_ip {
            config.feed_ip = feed_ip;
        }
        if let Some(feed_port) = cli.feed_port {
            config.feed_port = feed_port;
        }
        if let Some(log_dir) = cli.log_dir {
            config.log_dir = log_dir;
        }
        if cli.no_recover {
            config.no_recover = true;
        }
        if let Some(max_clients) = cli.max_clients {
            config.max_clients = max_clients;
        }

        Ok(config)
    }

    /// `ip:port` the client listener binds.
    pub fn client_addr(&self) -> String {
        format!("{}:{}", self.client_ip, self.client_port)
    }

    /// `ip:port` feed datagrams are sent to.
    pub fn feed_addr(&self) -> String {
        format!("{}:{}", self.feed_ip, self.feed_port)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}")),
        Err(_) => Ok(default),
    }
}
