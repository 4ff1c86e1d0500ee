//! Cold-start state reconstruction.
//!
//! Recovery is a sequential, single-threaded activity:
//! 1. load the highest-numbered snapshot (none -> fresh state);
//! 2. restore the book without matching and adopt the counters;
//! 3. replay every inbound-journal record after the snapshot's marker
//!    through the same handlers used at steady state, with feed
//!    publishing enabled -- the outbound journal reflects what was
//!    republished;
//! 4. write a fresh snapshot before the engine accepts clients.
//!
//! A journal whose marker is missing is an integrity failure: it is
//! logged and the engine continues from the snapshot alone rather than
//! guessing a different marker.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use matcher_core::OrderBook;
use matcher_protocol::{decode_line, ClientEnvelope, MSG_CANCEL, MSG_ORDER, MSG_STATE};

use crate::config::Config;
use crate::feed::FeedPublisher;
use crate::journal::{InboundJournal, OutboundJournal};
use crate::pipeline::Engine;
use crate::snapshot::Snapshotter;

/// State reconstructed from the snapshot scan, before replay.
pub struct RecoveredState {
    pub book: OrderBook,
    pub state_num: u64,
    pub output_seq: u64,
    /// Marker to replay from; `None` on a fresh or snapshot-less start.
    pub journal_marker: Option<u64>,
}

impl RecoveredState {
    pub fn fresh(product: &str) -> Self {
        RecoveredState {
            book: OrderBook::new(product),
            state_num: 0,
            output_seq: 0,
            journal_marker: None,
        }
    }
}

/// Load the latest snapshot, if one exists.
pub async fn load_latest(snapshots: &Snapshotter, product: &str) -> Result<RecoveredState> {
    let (_, path) = match snapshots.latest().await? {
        Some(found) => found,
        None => {
            info!("no snapshot found, starting with an empty book");
            return Ok(RecoveredState::fresh(product));
        }
    };

    let state = snapshots.load(&path).await?;
    info!(
        state_num = state.state_num,
        output_seq = state.output_seq,
        "loaded snapshot {}",
        path.display()
    );

    let marker = match state.state_num.checked_sub(1) {
        Some(marker) => Some(marker),
        None => {
            // A written snapshot always carries state_num >= 1; zero means
            // the file was not produced by this engine.
            error!("snapshot {} has state_num 0, skipping replay", path.display());
            None
        }
    };

    let state_num = state.state_num;
    let output_seq = state.output_seq;
    let mut book = OrderBook::new(product);
    book.restore(state.into_book_state());

    Ok(RecoveredState {
        book,
        state_num,
        output_seq,
        journal_marker: marker,
    })
}

/// Replay journal records written after `marker` through the engine.
pub async fn replay(engine: &mut Engine, lines: &[String], marker: u64) -> Result<()> {
    let mut start = None;
    for (i, line) in lines.iter().enumerate() {
        let envelope: ClientEnvelope = decode_line(line).context("reading inbound journal")?;
        if envelope.marker_num() == Some(marker) {
            start = Some(i + 1);
            break;
        }
    }

    let start = match start {
        Some(start) => start,
        None => {
            error!(
                marker,
                "state marker missing from inbound journal; continuing from snapshot alone"
            );
            return Ok(());
        }
    };

    let mut replayed = 0u64;
    for line in &lines[start..] {
        let envelope: ClientEnvelope = decode_line(line).context("reading inbound journal")?;
        match envelope.kind.as_str() {
            MSG_ORDER => engine.handle_order(envelope.payload.as_ref()).await?,
            MSG_CANCEL => {
                // A replayed reject has no connection to answer.
                let _ = engine.handle_cancel(envelope.payload.as_ref()).await?;
            }
            MSG_STATE => {} // later markers; nothing to apply
            other => warn!(kind = other, "unrecognized journal record skipped"),
        }
        replayed += 1;
    }
    info!(replayed, "journal replay complete");
    Ok(())
}

/// Build a ready-to-serve engine: storage, feed, recovery, and the
/// startup snapshot. `server::run` calls this before opening the
/// listener; tests drive it directly.
pub async fn bootstrap(config: &Config) -> Result<Engine> {
    let snapshots = Snapshotter::new(&config.log_dir, &config.product);

    let recovered = if config.no_recover {
        info!("recovery disabled (no_recover), cold start");
        RecoveredState::fresh(&config.product)
    } else {
        load_latest(&snapshots, &config.product).await?
    };

    // The journal tail must be read before the append handle goes live.
    let journal_lines = if recovered.journal_marker.is_some() {
        InboundJournal::read_all(&config.log_dir, &config.product).await?
    } else {
        Vec::new()
    };

    let feed_target: SocketAddr = config
        .feed_addr()
        .parse()
        .with_context(|| format!("invalid feed address {}", config.feed_addr()))?;
    let out_journal = OutboundJournal::open(&config.log_dir, &config.product).await?;
    let feed = FeedPublisher::new(feed_target, out_journal, recovered.output_seq).await?;
    let journal = InboundJournal::open(&config.log_dir, &config.product).await?;

    let mut engine = Engine::new(
        recovered.book,
        feed,
        journal,
        snapshots,
        recovered.state_num,
    );

    if let Some(marker) = recovered.journal_marker {
        replay(&mut engine, &journal_lines, marker).await?;
    }

    // A fresh snapshot always lands on disk before clients are accepted.
    engine.write_state().await?;
    Ok(engine)
}
