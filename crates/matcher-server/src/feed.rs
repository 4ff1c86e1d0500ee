//! Multicast feed publisher.
//!
//! Owns the outbound sequence counter and emits each message exactly once
//! to the feed socket and to the outbound journal. The journal write is
//! fire-and-forget; the datagram send failure is a warning, not an error,
//! because the book has already advanced and replay will republish.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use matcher_protocol::{encode_line, FeedEnvelope};

use crate::journal::OutboundJournal;

pub struct FeedPublisher {
    seq: u64,
    socket: UdpSocket,
    target: SocketAddr,
    journal: OutboundJournal,
}

impl FeedPublisher {
    /// Bind the feed socket. `seq` is the next sequence to assign: 0 for a
    /// fresh engine, the snapshot's `output_seq` after recovery.
    pub async fn new(target: SocketAddr, journal: OutboundJournal, seq: u64) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("binding feed socket")?;
        if target.is_ipv4() {
            if let Err(e) = socket.set_multicast_ttl_v4(1) {
                warn!("could not set multicast ttl: {e}");
            }
        }
        info!(%target, next_seq = seq, "feed publisher ready");
        Ok(FeedPublisher {
            seq,
            socket,
            target,
            journal,
        })
    }

    /// Next sequence number to assign.
    pub fn output_seq(&self) -> u64 {
        self.seq
    }

    /// Journal and multicast one envelope, then advance the sequence.
    pub async fn publish<T: Serialize>(&mut self, kind: &str, payload: &T) -> Result<()> {
        let envelope = FeedEnvelope {
            kind: kind.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            seq: self.seq,
            payload: serde_json::to_value(payload).context("encoding feed payload")?,
        };
        let line = encode_line(&envelope).context("encoding feed envelope")?;

        self.journal.append(line.clone());

        if let Err(e) = self.socket.send_to(line.as_bytes(), self.target).await {
            warn!(seq = envelope.seq, "feed send failed: {e}");
        }

        self.seq += 1;
        Ok(())
    }
}
