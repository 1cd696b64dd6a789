//! Three-source session reconciliation.
//!
//! The merge is the one read path every consumer sees, so the precedence
//! rule lives here, written once: archival rows are the baseline, the job
//! scan overrides them, and live interactive sessions overlay last —
//! except that a terminal status is never regressed back to a live one.
//! Within one call the three sources are applied in a fixed order, so the
//! result is deterministic for a given snapshot of inputs.

use std::collections::HashMap;

use crate::model::{Session, SessionKind};

/// Merge the three session sources into one deduplicated, sorted list.
pub fn merge_sessions(
    archival: Vec<Session>,
    job_scan: Vec<Session>,
    live: Vec<Session>,
) -> Vec<Session> {
    // Baseline: everything the archive knows. Keyed by ID; order is
    // re-established by the final sort.
    let mut merged: Vec<Session> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for session in archival {
        index.insert(session.id.clone(), merged.len());
        merged.push(session);
    }

    // Job scan: authoritative for status and job-specific fields. The
    // archival row only contributes context the scan could not know.
    for job in job_scan {
        match index.get(&job.id) {
            Some(&i) => {
                let baseline = merged[i].clone();
                merged[i] = overlay_job(baseline, job);
            }
            None => {
                index.insert(job.id.clone(), merged.len());
                merged.push(job);
            }
        }
    }

    // Live sessions last. A live entry may match an existing row by ID,
    // or be the process backing an interactive-agent job entry.
    for live_session in live {
        let slot = index.get(&live_session.id).copied().or_else(|| {
            merged
                .iter()
                .position(|existing| backs_job_entry(existing, &live_session))
        });
        match slot {
            Some(i) => overlay_live(&mut merged[i], live_session),
            None => {
                index.insert(live_session.id.clone(), merged.len());
                merged.push(live_session);
            }
        }
    }

    sort_sessions(&mut merged);
    merged
}

/// Whether a live entry with an unmatched ID is the process backing an
/// existing interactive-agent job entry.
///
/// The rule, in one place: the job entry must be an interactive agent,
/// and either its recorded linkage ID names the live session, or both
/// point at the same job file.
fn backs_job_entry(job_entry: &Session, live_session: &Session) -> bool {
    if job_entry.kind != SessionKind::InteractiveAgent {
        return false;
    }
    if job_entry.job.linked_session_id.as_deref() == Some(live_session.id.as_str()) {
        return true;
    }
    job_entry.job.source_path.is_some() && job_entry.job.source_path == live_session.job.source_path
}

/// Job scan beats archival: take the scanned session, keep archival
/// context only where the scan has none.
fn overlay_job(baseline: Session, job: Session) -> Session {
    let mut merged = job;
    merged.repo = merged.repo.or(baseline.repo);
    merged.branch = merged.branch.or(baseline.branch);
    merged.cwd = merged.cwd.or(baseline.cwd);
    merged.pid = merged.pid.or(baseline.pid);
    merged.started_at = merged.started_at.or(baseline.started_at);
    merged.last_activity_at = merged.last_activity_at.or(baseline.last_activity_at);
    merged.ended_at = merged.ended_at.or(baseline.ended_at);
    merged
}

/// Live overlay. Terminal-state monotonicity is enforced here: a session
/// already terminal keeps its status; only liveness details (PID, last
/// activity, linkage) are refreshed from the live entry.
fn overlay_live(existing: &mut Session, live_session: Session) {
    if existing.status.is_live() {
        existing.status = live_session.status;
    }
    if live_session.pid.is_some() {
        existing.pid = live_session.pid;
    }
    if live_session.last_activity_at.is_some() {
        existing.last_activity_at = live_session.last_activity_at;
    }
    if live_session.job.linked_session_id.is_some() {
        existing.job.linked_session_id = live_session.job.linked_session_id;
    }
    if existing.cwd.is_none() {
        existing.cwd = live_session.cwd;
    }
    if existing.started_at.is_none() {
        existing.started_at = live_session.started_at;
    }
}

/// Status bucket first (running, then idle/pending, then the rest), most
/// recent activity next, start time as the fallback, ID as the final
/// tiebreak so output is stable.
pub fn sort_sessions(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        a.status
            .priority_bucket()
            .cmp(&b.status.priority_bucket())
            .then_with(|| b.activity_key().cmp(&a.activity_key()))
            .then_with(|| a.id.cmp(&b.id))
    });
}
