//! TCP listener and top-level server wiring.
//!
//! This module:
//! - reconstructs engine state (snapshot + journal replay),
//! - spawns the single pipeline task that owns the engine,
//! - accepts client connections, assigning each a `ClientId`,
//! - spawns a per-client task to handle I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::client;
use crate::config::Config;
use crate::pipeline;
use crate::recovery;
use crate::types::{ClientId, ClientRegistry, EngineRx, EngineTx, ReplyRx, ReplyTx};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    ClientId(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Run the engine with the given configuration. Recovery completes and a
/// fresh snapshot is on disk before the listener opens.
pub async fn run(config: Config) -> Result<()> {
    let engine = recovery::bootstrap(&config).await?;

    let listener = TcpListener::bind(&config.client_addr())
        .await
        .with_context(|| format!("binding client listener on {}", config.client_addr()))?;

    info!(
        product = %config.product,
        client = %config.client_addr(),
        feed = %config.feed_addr(),
        "matcher serving"
    );

    let clients: ClientRegistry = Arc::new(RwLock::new(HashMap::new()));
    let (engine_tx, engine_rx): (EngineTx, EngineRx) = mpsc::unbounded_channel();

    {
        let clients = clients.clone();
        tokio::spawn(async move {
            pipeline::run_pipeline(engine, engine_rx, clients).await;
        });
    }

    loop {
        let (stream, peer_addr) = listener.accept().await.context("accepting connection")?;

        let connected = {
            let guard = clients.read().await;
            guard.len()
        };
        if connected >= config.max_clients {
            warn!(%peer_addr, max = config.max_clients, "rejecting connection: max clients reached");
            // Dropping the stream closes it.
            continue;
        }

        let client_id = next_client_id();
        info!(%peer_addr, client = client_id.0, "accepted connection");
        if let Err(e) = stream.set_nodelay(true) {
            warn!(client = client_id.0, "could not set nodelay: {e}");
        }

        let (reply_tx, reply_rx): (ReplyTx, ReplyRx) = mpsc::unbounded_channel();
        {
            let mut guard = clients.write().await;
            guard.insert(client_id, reply_tx);
        }

        let clients = clients.clone();
        let engine_tx = engine_tx.clone();
        tokio::spawn(async move {
            client::run_client(client_id, stream, engine_tx, reply_rx, clients).await;
            info!(client = client_id.0, "client disconnected");
        });
    }
}
