//! Zombie job detection and repair.
//!
//! A zombie is a job file that declares a live status, is of a kind that
//! must be backed by a live interactive session, and has no live session
//! linked to its path. Repair rewrites the declared status to
//! `interrupted` in place; re-running over repaired files finds nothing,
//! so the batch is idempotent. This is best-effort batch repair, not a
//! transaction — a file that cannot be written is logged and skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::model::{Session, SessionStatus};
use crate::parser::set_job_status;

/// Outcome of one repair batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub detected: usize,
    pub updated: usize,
    pub failed: usize,
    pub dry_run: bool,
}

/// Find job sessions that claim to be live but have no backing session.
///
/// Only kinds that require a live session (chat, interactive agents) can
/// be zombies; lock-file kinds are already handled by status derivation.
pub fn detect(live_sessions: &[Session], job_sessions: &[Session]) -> Vec<Session> {
    // Job paths come from the scanner canonicalized; live metadata paths
    // are whatever the session bootstrap wrote. Compare canonical forms.
    let linked_paths: HashSet<PathBuf> = live_sessions
        .iter()
        .filter_map(|s| s.job.source_path.as_ref())
        .map(|p| canonical(p))
        .collect();

    job_sessions
        .iter()
        .filter(|job| job.kind.requires_live_session())
        .filter(|job| job.status.is_live())
        .filter(|job| {
            job.job
                .source_path
                .as_ref()
                .is_some_and(|path| !linked_paths.contains(&canonical(path)))
        })
        .cloned()
        .collect()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Rewrite each zombie's declared status to `interrupted`.
///
/// In dry-run mode nothing is written; the report still counts what
/// would have been updated.
pub fn repair(zombies: &[Session], dry_run: bool) -> RepairReport {
    let mut updated = 0;
    let mut failed = 0;

    for zombie in zombies {
        let Some(path) = zombie.job.source_path.as_ref() else {
            continue;
        };
        if dry_run {
            updated += 1;
            continue;
        }
        match set_job_status(path, SessionStatus::Interrupted) {
            Ok(()) => updated += 1,
            Err(e) => {
                warn!("Could not repair {}: {e:#}", path.display());
                failed += 1;
            }
        }
    }

    RepairReport {
        detected: zombies.len(),
        updated,
        failed,
        dry_run,
    }
}
