//! Per-file parse cache.
//!
//! Repeated full scans visit the same job files over and over; parsing is
//! skipped for any file whose modification time exactly matches what we
//! saw last. Entries live for the process lifetime — job files number in
//! the hundreds, so the map never needs eviction. Failed parses are
//! cached too (as `None`) so a broken file costs one parse per mtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::debug;

use crate::model::Session;
use crate::parser::parse_job_file;

struct CacheEntry {
    mtime: SystemTime,
    session: Option<Session>,
}

/// Mtime-keyed cache over `parse_job_file`.
///
/// Safe under concurrent callers; the map lock is coarse and never held
/// across file I/O, so two workers racing on the same changed file may
/// both parse it — harmless, the results are identical.
#[derive(Default)]
pub struct ParseCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    parses: AtomicU64,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a job file to a session, reusing the cached result while
    /// the file's modification time is unchanged.
    pub fn resolve(&self, path: &Path) -> Option<Session> {
        let mtime = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
                return None;
            }
        };

        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(path) {
                if entry.mtime == mtime {
                    return entry.session.clone();
                }
            }
        }

        self.parses.fetch_add(1, Ordering::Relaxed);
        let session = match parse_job_file(path) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("Skipping {}: {e:#}", path.display());
                None
            }
        };

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(path.to_path_buf(), CacheEntry {
            mtime,
            session: session.clone(),
        });
        session
    }

    /// How many real parses have happened. Test instrumentation for the
    /// reuse guarantee.
    pub fn parse_count(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }
}
