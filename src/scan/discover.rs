//! Full discovery scan.
//!
//! Walks every plan/chat directory the workspace resolver knows about,
//! parses candidate job files through the per-file cache, deduplicates by
//! file path, resolves effective ownership, and re-verifies the status of
//! everything non-terminal against lock files and the liveness probe.
//!
//! The walk is one producer thread feeding a bounded queue; a fixed pool
//! of workers drains it. The walk is I/O-bound and parses benefit from
//! parallel reads, but unbounded concurrency would exhaust file
//! descriptors on big workspaces.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::debug;
use walkdir::WalkDir;

use crate::model::Session;
use crate::process::LivenessProbe;
use crate::scan::parse_cache::ParseCache;
use crate::scan::status::verify_sessions;
use crate::workspace::{effective_owner, in_note_group, CandidateDir, WorkspaceResolver};

/// Markdown files that live in plan/chat directories but are not jobs.
const FILENAME_DENYLIST: &[&str] = &["README.md", "TEMPLATE.md", "INDEX.md", "NOTES.md"];

/// Subdirectories the walk never descends into.
const SKIPPED_DIRS: &[&str] = &["archive"];

/// Queue depth between the walker and the parser pool.
const WALK_QUEUE_DEPTH: usize = 256;

pub struct Scanner {
    resolver: Arc<dyn WorkspaceResolver>,
    probe: Arc<dyn LivenessProbe>,
    parse_cache: Arc<ParseCache>,
    workers: usize,
}

impl Scanner {
    pub fn new(
        resolver: Arc<dyn WorkspaceResolver>,
        probe: Arc<dyn LivenessProbe>,
        parse_cache: Arc<ParseCache>,
        workers: usize,
    ) -> Self {
        Self {
            resolver,
            probe,
            parse_cache,
            workers: workers.max(1),
        }
    }

    /// Run one full scan.
    ///
    /// Individual unreadable or unparseable files are skipped; only a
    /// failure to set up the scan itself is an error.
    pub fn scan(&self) -> Result<Vec<Session>> {
        let dirs = self.resolver.candidate_dirs();

        let (file_tx, file_rx) = mpsc::sync_channel::<(PathBuf, CandidateDir)>(WALK_QUEUE_DEPTH);
        let (session_tx, session_rx) = mpsc::channel::<Session>();
        let file_rx = Arc::new(Mutex::new(file_rx));

        let mut by_path: HashMap<PathBuf, Session> = HashMap::new();

        thread::scope(|scope| {
            scope.spawn(move || {
                for dir in &dirs {
                    walk_candidate_dir(dir, &file_tx);
                }
                // Dropping file_tx here ends the workers' recv loops.
            });

            for _ in 0..self.workers {
                let file_rx = Arc::clone(&file_rx);
                let session_tx = session_tx.clone();
                scope.spawn(move || loop {
                    let next = file_rx.lock().unwrap_or_else(|e| e.into_inner()).recv();
                    let Ok((path, dir)) = next else {
                        break;
                    };
                    if let Some(session) = self.resolve_file(&path, &dir) {
                        if session_tx.send(session).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(session_tx);

            // Collector: a file path contributes at most one session.
            for session in session_rx {
                if let Some(path) = session.job.source_path.clone() {
                    by_path.entry(path).or_insert(session);
                }
            }
        });

        let mut sessions: Vec<Session> = by_path.into_values().collect();
        verify_sessions(&mut sessions, self.probe.as_ref());
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }

    /// Parse one candidate file and attach ownership context.
    fn resolve_file(&self, path: &Path, dir: &CandidateDir) -> Option<Session> {
        let mut session = self.parse_cache.resolve(path)?;

        let owner = effective_owner(
            self.resolver.as_ref(),
            &dir.owner,
            session.job.worktree.as_deref(),
            in_note_group(&dir.path, path),
        );
        session.repo = Some(owner.name);
        if session.cwd.is_none() {
            session.cwd = Some(owner.path);
        }
        session.job.plan = plan_group(&dir.path, path);

        // Canonical path is the dedup key; fall back to the walked path
        // if the file vanished mid-scan.
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        session.job.source_path = Some(canonical);
        Some(session)
    }
}

/// Walk one candidate directory, sending job-file candidates downstream.
fn walk_candidate_dir(dir: &CandidateDir, file_tx: &mpsc::SyncSender<(PathBuf, CandidateDir)>) {
    let walker = WalkDir::new(&dir.path).into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            return !SKIPPED_DIRS.contains(&name.as_ref()) && !name.starts_with('.');
        }
        true
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {e}", dir.path.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if FILENAME_DENYLIST.contains(&name.as_ref()) {
            continue;
        }
        if file_tx.send((path.to_path_buf(), dir.clone())).is_err() {
            return;
        }
    }
}

/// First directory component between the candidate dir and the file, when
/// the job is filed under a plan group.
fn plan_group(candidate_dir: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(candidate_dir).ok()?;
    let mut components = rel.components();
    let first = components.next()?;
    // A bare file directly in the candidate dir has no group.
    components.next()?;
    Some(first.as_os_str().to_string_lossy().into_owned())
}
