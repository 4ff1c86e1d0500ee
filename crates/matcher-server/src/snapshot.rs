//! Engine state snapshots on disk.
//!
//! One file per generation: `matcher_state.<product>.<n>.json`, where `n`
//! is the generation at capture time and the file body carries
//! `state_num = n + 1`. Files are written to a temp name and renamed into
//! place so a torn write never shows up in the latest-by-number scan.
//! Old snapshots are left behind for forensics.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use matcher_core::EngineState;
use tracing::info;

pub struct Snapshotter {
    dir: PathBuf,
    product: String,
}

impl Snapshotter {
    pub fn new(dir: impl Into<PathBuf>, product: impl Into<String>) -> Self {
        Snapshotter {
            dir: dir.into(),
            product: product.into(),
        }
    }

    /// File path for generation `n`.
    pub fn path_for(&self, n: u64) -> PathBuf {
        self.dir
            .join(format!("matcher_state.{}.{}.json", self.product, n))
    }

    /// Write one snapshot as generation `n`.
    pub async fn write(&self, n: u64, state: &EngineState) -> Result<()> {
        let final_path = self.path_for(n);
        let tmp_path = final_path.with_extension("json.tmp");

        let body = serde_json::to_string(state).context("serializing snapshot")?;
        tokio::fs::write(&tmp_path, body)
            .await
            .with_context(|| format!("writing snapshot {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .with_context(|| format!("renaming snapshot into {}", final_path.display()))?;

        info!("wrote snapshot {}", final_path.display());
        Ok(())
    }

    /// The highest-numbered snapshot on disk, if any. A missing directory
    /// means no snapshot was ever written.
    pub async fn latest(&self) -> Result<Option<(u64, PathBuf)>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading state directory {}", self.dir.display()))
            }
        };

        let prefix = format!("matcher_state.{}.", self.product);
        let mut best: Option<(u64, PathBuf)> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("reading state directory {}", self.dir.display()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let rest = match name.strip_prefix(&prefix) {
                Some(rest) => rest,
                None => continue,
            };
            let num = match rest.strip_suffix(".json") {
                Some(num) => num,
                None => continue,
            };
            // Numeric ordering, not lexicographic: 10 beats 9.
            let n = match num.parse::<u64>() {
                Ok(n) => n,
                Err(_) => continue,
            };
            if best.as_ref().map_or(true, |(b, _)| n > *b) {
                best = Some((n, entry.path()));
            }
        }
        Ok(best)
    }

    /// Load one snapshot file.
    pub async fn load(&self, path: &Path) -> Result<EngineState> {
        let body = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        serde_json::from_str(&body)
            .with_context(|| format!("parsing snapshot {}", path.display()))
    }
}
