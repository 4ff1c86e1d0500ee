//! Append-only line journals.
//!
//! Two logs with very different contracts:
//! - the **inbound** journal is authoritative for recovery: appends are
//!   awaited by the writer before the input is applied, and a failed
//!   append stops the writer (applying an unjournaled input would make
//!   recovery ambiguous);
//! - the **outbound** journal exists for post-hoc reconciliation only: a
//!   dedicated task drains a channel, and failures are warned, never
//!   surfaced to the writer loop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Path of the inbound journal for a product.
pub fn inbound_path(dir: &Path, product: &str) -> PathBuf {
    dir.join(format!("matcher.{product}.log"))
}

/// Path of the outbound journal for a product.
pub fn outbound_path(dir: &Path, product: &str) -> PathBuf {
    dir.join(format!("matcher_out.{product}.log"))
}

/// The durable log of every state-affecting input and snapshot marker.
/// Single writer, append-only for the process lifetime.
pub struct InboundJournal {
    path: PathBuf,
    file: File,
}

impl InboundJournal {
    pub async fn open(dir: &Path, product: &str) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let path = inbound_path(dir, product);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("opening inbound journal {}", path.display()))?;
        info!("inbound journal at {}", path.display());
        Ok(InboundJournal { path, file })
    }

    /// Append one encoded record and push it to the OS before returning.
    /// The caller must not apply the input until this resolves.
    pub async fn append(&mut self, line: &str) -> Result<()> {
        self.file
            .write_all(line.as_bytes())
            .await
            .context("inbound journal append failed")?;
        self.file
            .flush()
            .await
            .context("inbound journal flush failed")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All journal lines, oldest first. A missing file reads as empty
    /// (nothing was ever journaled); any other I/O error surfaces.
    pub async fn read_all(dir: &Path, product: &str) -> Result<Vec<String>> {
        let path = inbound_path(dir, product);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => {
                Err(e).with_context(|| format!("reading inbound journal {}", path.display()))
            }
        }
    }
}

/// Fire-and-forget sink for published feed envelopes.
#[derive(Clone)]
pub struct OutboundJournal {
    tx: mpsc::UnboundedSender<String>,
}

impl OutboundJournal {
    /// Open the log and spawn its writer task.
    pub async fn open(dir: &Path, product: &str) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let path = outbound_path(dir, product);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("opening outbound journal {}", path.display()))?;
        info!("outbound journal at {}", path.display());

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    warn!("outbound journal write failed: {e}");
                    continue;
                }
                if let Err(e) = file.flush().await {
                    warn!("outbound journal flush failed: {e}");
                }
            }
        });

        Ok(OutboundJournal { tx })
    }

    /// Enqueue one encoded envelope. Never blocks the caller; a closed
    /// channel means the process is shutting down and the line is lost,
    /// which reconciliation tolerates.
    pub fn append(&self, line: String) {
        let _ = self.tx.send(line);
    }
}
