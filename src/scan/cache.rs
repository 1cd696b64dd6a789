//! Persistent scan cache.
//!
//! A timestamped JSON snapshot of the last full scan, shared across
//! process invocations. Writers replace it atomically; readers tolerate
//! absence, corruption and staleness by reporting cache-empty. The cache
//! is deliberately never locked — atomic rename plus staleness tolerance
//! is the whole consistency story.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::fs::atomic::atomic_replace;
use crate::model::Session;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    timestamp: DateTime<Utc>,
    sessions: Vec<Session>,
}

pub struct ScanCache {
    path: PathBuf,
    ttl: Duration,
}

impl ScanCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached session list.
    ///
    /// `ignore_ttl` serves any snapshot regardless of age — the fast path
    /// for cold-start bootstrapping and background refresh. With TTL
    /// enforcement, a snapshot older than the TTL reads as cache-empty.
    /// Missing or corrupt files always read as cache-empty.
    pub fn read(&self, ignore_ttl: bool) -> Option<Vec<Session>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Treating corrupt scan cache {} as empty: {e}", self.path.display());
                return None;
            }
        };

        if !ignore_ttl {
            let age = Utc::now().signed_duration_since(snapshot.timestamp);
            let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::zero());
            if age > ttl {
                return None;
            }
        }

        Some(snapshot.sessions)
    }

    /// Replace the cache with a fresh snapshot, atomically.
    pub fn write(&self, sessions: &[Session]) -> Result<()> {
        let snapshot = Snapshot {
            timestamp: Utc::now(),
            sessions: sessions.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize scan cache")?;
        atomic_replace(&self.path, &json)
    }
}
