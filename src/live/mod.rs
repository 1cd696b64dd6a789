//! Live interactive-session directory scanning.
//!
//! Each interactive session leaves a record under the live root: a
//! directory holding `pid.lock` and `session.json`. Records outlive their
//! process — history is worth keeping — so a dead session is reported as
//! interrupted on read instead of being deleted. The exceptions: a dead
//! session linked to an agent job fires the orchestrator's completion
//! path (the process dying is the only signal that the job finished), and
//! a dead record linked to nothing is an orphan and is removed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::model::{Session, SessionKind, SessionStatus};
use crate::process::{read_lock_pid, LivenessProbe};
use crate::store::ArchiveStore;

/// Lock file inside each live-session directory.
const PID_LOCK: &str = "pid.lock";

/// Metadata file inside each live-session directory.
const META_FILE: &str = "session.json";

/// Per-session metadata written by the session bootstrap.
#[derive(Debug, Deserialize)]
pub struct LiveSessionMeta {
    pub session_id: String,
    pub pid: Option<u32>,
    pub working_directory: Option<PathBuf>,
    pub user: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub kind: Option<SessionKind>,
    #[serde(default)]
    pub job_file_path: Option<PathBuf>,
    /// Linkage cross-reference to the job entry this process backs.
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Boundary for telling the orchestrator a dead agent job is finished.
///
/// A trait so tests can record invocations synchronously instead of
/// racing a detached thread.
pub trait CompletionSink: Send + Sync {
    fn job_finished(&self, job_file: &Path);
}

/// Real sink: invokes the orchestrator executable with the job-file path
/// from a detached thread, after a fixed grace delay. Output is discarded
/// unless debug output is on. Failures never surface — the next scan is
/// the retry.
pub struct OrchestratorTrigger {
    program: Option<PathBuf>,
    grace: Duration,
    debug_output: bool,
}

impl OrchestratorTrigger {
    pub fn new(program: Option<PathBuf>, grace: Duration, debug_output: bool) -> Self {
        Self {
            program,
            grace,
            debug_output,
        }
    }
}

impl CompletionSink for OrchestratorTrigger {
    fn job_finished(&self, job_file: &Path) {
        let Some(program) = self.program.clone() else {
            debug!("No completion trigger configured; leaving {} to the next scan", job_file.display());
            return;
        };
        let job_file = job_file.to_path_buf();
        let grace = self.grace;
        let debug_output = self.debug_output;

        std::thread::Builder::new()
            .name("vigil-trigger".to_string())
            .spawn(move || {
                std::thread::sleep(grace);
                let mut command = Command::new(&program);
                command.arg(&job_file);
                if debug_output {
                    command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
                } else {
                    command.stdout(Stdio::null()).stderr(Stdio::null());
                }
                match command.spawn().and_then(|mut child| child.wait()) {
                    Ok(status) if debug_output => {
                        debug!("Completion trigger for {} exited with {status}", job_file.display())
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Completion trigger for {} failed: {e}", job_file.display()),
                }
            })
            .ok();
    }
}

pub struct LiveScanner {
    root: PathBuf,
    probe: Arc<dyn LivenessProbe>,
    sink: Arc<dyn CompletionSink>,
}

impl LiveScanner {
    pub fn new(root: impl Into<PathBuf>, probe: Arc<dyn LivenessProbe>, sink: Arc<dyn CompletionSink>) -> Self {
        Self {
            root: root.into(),
            probe,
            sink,
        }
    }

    /// Scan the live root and classify every session record.
    ///
    /// Sessions confirmed alive are overlaid with last-known status and
    /// activity from the archival store, so an explicit idle marking the
    /// store recorded survives the rescan.
    pub fn scan(&self, store: Option<&ArchiveStore>) -> Result<Vec<Session>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read live root {}", self.root.display()))?;

        let mut sessions = Vec::new();
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            match self.classify(&dir, store) {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => debug!("Skipping live entry {}: {e:#}", dir.display()),
            }
        }

        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }

    /// Classify one live-session directory. `Ok(None)` means the entry
    /// was an orphan and has been removed.
    fn classify(&self, dir: &Path, store: Option<&ArchiveStore>) -> Result<Option<Session>> {
        let meta_path = dir.join(META_FILE);
        let content = std::fs::read_to_string(&meta_path)
            .with_context(|| format!("Failed to read {}", meta_path.display()))?;
        let meta: LiveSessionMeta = serde_json::from_str(&content)
            .with_context(|| format!("Invalid metadata in {}", meta_path.display()))?;

        let pid = read_lock_pid(&dir.join(PID_LOCK)).or(meta.pid);
        let alive = pid.is_some_and(|pid| self.probe.is_alive(pid));
        let kind = meta.kind.unwrap_or_default();

        if !alive {
            return self.on_dead_session(dir, meta, kind);
        }

        let mut session = Session::new(meta.session_id, kind, SessionStatus::Running);
        session.pid = pid;
        session.cwd = meta.working_directory;
        session.started_at = meta.started_at;
        session.job.source_path = meta.job_file_path;
        session.job.linked_session_id = meta.agent_id;

        if let Some(store) = store {
            enrich_from_store(&mut session, store);
        }

        Ok(Some(session))
    }

    fn on_dead_session(
        &self,
        dir: &Path,
        meta: LiveSessionMeta,
        kind: SessionKind,
    ) -> Result<Option<Session>> {
        match &meta.job_file_path {
            Some(job_file) => {
                // A dead agent process is the only completion signal its
                // job will ever get; hand it to the orchestrator.
                if matches!(kind, SessionKind::Agent | SessionKind::InteractiveAgent) {
                    self.sink.job_finished(job_file);
                }

                let mut session = Session::new(meta.session_id, kind, SessionStatus::Interrupted);
                session.cwd = meta.working_directory;
                session.started_at = meta.started_at;
                session.job.source_path = meta.job_file_path;
                session.job.linked_session_id = meta.agent_id;
                Ok(Some(session))
            }
            None => {
                // Stale orphan with no job linkage: nothing references
                // this record anymore.
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    warn!("Failed to remove orphan live entry {}: {e}", dir.display());
                }
                Ok(None)
            }
        }
    }
}

/// Overlay archival knowledge on a live session: an explicitly recorded
/// live status (idle, pending_user) and the recorded activity time win
/// over the bare "process exists" signal.
fn enrich_from_store(session: &mut Session, store: &ArchiveStore) {
    let row = match store.get(&session.id) {
        Ok(Some(row)) => row,
        Ok(None) => return,
        Err(e) => {
            debug!("Archive lookup for {} failed: {e}", session.id);
            return;
        }
    };

    if row.status.is_live() {
        session.status = row.status;
    }
    if row.last_activity_at.is_some() {
        session.last_activity_at = row.last_activity_at;
    }
    if session.repo.is_none() {
        session.repo = row.repo;
    }
    if session.branch.is_none() {
        session.branch = row.branch;
    }
}
