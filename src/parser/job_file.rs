//! Reading and mutating orchestrator job files.
//!
//! A job file's frontmatter carries at minimum `id`, `status` and `type`;
//! `title`, `start_time`, `updated_at` and `worktree` are optional. vigil
//! never creates or deletes job files; it only reads them and, for zombie
//! repair and manual marking, rewrites the `status` field in place.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::fs::locking::{locked_read, locked_write};
use crate::model::{Session, SessionKind, SessionStatus};
use crate::parser::frontmatter::{parse_from_markdown, rewrite_top_level_field};

/// Typed view of a job file's recognized frontmatter keys. Everything
/// else in the block is ignored.
#[derive(Debug, Deserialize)]
struct JobHeader {
    id: String,
    status: SessionStatus,
    #[serde(rename = "type")]
    kind: SessionKind,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    worktree: Option<String>,
    /// Cross-reference to the interactive session executing this job,
    /// written by the orchestrator when it hands the job to an agent.
    #[serde(default)]
    session_id: Option<String>,
}

/// Parse one job file into a `Session`.
///
/// The declared status is taken as-is here; real-time verification against
/// lock files and the liveness probe happens in the scan layer.
pub fn parse_job_file(path: &Path) -> Result<Session> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file: {}", path.display()))?;

    let header: JobHeader = parse_from_markdown(&content, "job header")
        .with_context(|| format!("Invalid job file: {}", path.display()))?;

    let mut session = Session::new(header.id, header.kind, header.status);
    session.started_at = header.start_time.or(header.updated_at);
    session.last_activity_at = header.updated_at;
    session.job.title = header.title;
    session.job.worktree = header.worktree;
    session.job.linked_session_id = header.session_id;
    session.job.source_path = Some(path.to_path_buf());
    Ok(session)
}

/// Rewrite a job file's declared status in place.
///
/// Reads and writes under fs2 advisory locks so a concurrent orchestrator
/// update cannot interleave with ours. Everything outside the one `status`
/// line is preserved byte-for-byte.
pub fn set_job_status(path: &Path, status: SessionStatus) -> Result<()> {
    let content = locked_read(path)?;
    let rewritten = rewrite_top_level_field(&content, "status", status.as_str())
        .with_context(|| format!("Cannot update status in {}", path.display()))?;
    locked_write(path, &rewritten)
}
