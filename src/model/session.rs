//! The unified session model exposed to every consumer.
//!
//! A `Session` is one unit of AI-agent work, regardless of where it was
//! discovered: the archival database, a job file scan, or the live
//! interactive-session directory. Job-specific fields are always present
//! (empty when inapplicable) so no consumer needs runtime type inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Lifecycle status of a session.
///
/// The live set is `Running`, `Idle`, `PendingUser`. Everything else is
/// terminal or queued and is never auto-transitioned: once a job file
/// declares one of those, the declared value is authoritative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Idle,
    PendingUser,
    Completed,
    Failed,
    Interrupted,
    Error,
    Hold,
    /// Queued work that has not started yet. Orchestrators also write
    /// this as `pending`.
    #[serde(alias = "pending")]
    Todo,
    Abandoned,
}

impl SessionStatus {
    /// Statuses that describe a session with a live backing process.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionStatus::Running | SessionStatus::Idle | SessionStatus::PendingUser
        )
    }

    /// Terminal or queued statuses. These are authoritative from their
    /// source and must never be re-derived or regressed at merge time.
    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }

    /// Sort bucket: running first, then idle/waiting, then the rest.
    pub fn priority_bucket(self) -> u8 {
        match self {
            SessionStatus::Running => 0,
            SessionStatus::Idle | SessionStatus::PendingUser => 1,
            _ => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Idle => "idle",
            SessionStatus::PendingUser => "pending_user",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Interrupted => "interrupted",
            SessionStatus::Error => "error",
            SessionStatus::Hold => "hold",
            SessionStatus::Todo => "todo",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(SessionStatus::Running),
            "idle" => Ok(SessionStatus::Idle),
            "pending_user" => Ok(SessionStatus::PendingUser),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            "interrupted" => Ok(SessionStatus::Interrupted),
            "error" => Ok(SessionStatus::Error),
            "hold" => Ok(SessionStatus::Hold),
            "todo" | "pending" => Ok(SessionStatus::Todo),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(anyhow::anyhow!("Unknown session status: {other}")),
        }
    }
}

/// The kind of work unit a session represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Interactive coding-assistant session.
    #[default]
    #[serde(alias = "interactive")]
    Code,
    Chat,
    Oneshot,
    /// Headless background agent driven by the orchestrator.
    #[serde(alias = "headless_agent")]
    Agent,
    /// Agent running inside an interactive session (tmux window etc.).
    InteractiveAgent,
    Shell,
}

impl SessionKind {
    /// Kinds whose jobs prove liveness through a `<jobfile>.lock` PID.
    ///
    /// Chat and interactive-agent work is tied to a long-lived foreground
    /// process instead; their declared status stands on its own.
    pub fn uses_lock_file(self) -> bool {
        !matches!(self, SessionKind::Chat | SessionKind::InteractiveAgent)
    }

    /// Kinds whose jobs must be backed by an entry in the live-session
    /// directory. Jobs of these kinds with no such entry are zombies.
    pub fn requires_live_session(self) -> bool {
        matches!(self, SessionKind::Chat | SessionKind::InteractiveAgent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Code => "code",
            SessionKind::Chat => "chat",
            SessionKind::Oneshot => "oneshot",
            SessionKind::Agent => "agent",
            SessionKind::InteractiveAgent => "interactive_agent",
            SessionKind::Shell => "shell",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" | "interactive" => Ok(SessionKind::Code),
            "chat" => Ok(SessionKind::Chat),
            "oneshot" => Ok(SessionKind::Oneshot),
            "agent" | "headless_agent" => Ok(SessionKind::Agent),
            "interactive_agent" => Ok(SessionKind::InteractiveAgent),
            "shell" => Ok(SessionKind::Shell),
            other => Err(anyhow::anyhow!("Unknown session kind: {other}")),
        }
    }
}

/// Job-file specific fields. Always present on a `Session`; empty for
/// sessions that did not come from a job file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct JobFields {
    /// Plan the job belongs to, when derivable from its directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Path of the job file (or, for a live session, the job file it is
    /// linked to).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    /// Declared worktree hint, re-resolved by the workspace resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
    /// Cross-reference to the interactive session executing this job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_session_id: Option<String>,
}

impl JobFields {
    pub fn is_empty(&self) -> bool {
        self.plan.is_none()
            && self.title.is_none()
            && self.source_path.is_none()
            && self.worktree.is_none()
            && self.linked_session_id.is_none()
    }
}

/// One unit of AI-agent work as presented to consumers.
///
/// IDs are unique within a source but not across sources; reconciliation
/// deduplicates by ID at merge time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub kind: SessionKind,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub job: JobFields,
}

impl Session {
    /// Create a session with only identity, kind and status set.
    pub fn new(id: impl Into<String>, kind: SessionKind, status: SessionStatus) -> Self {
        Self {
            id: id.into(),
            kind,
            status,
            pid: None,
            repo: None,
            branch: None,
            cwd: None,
            started_at: None,
            last_activity_at: None,
            ended_at: None,
            job: JobFields::default(),
        }
    }

    /// Most recent activity, falling back to start time. Used for sorting.
    pub fn activity_key(&self) -> Option<DateTime<Utc>> {
        self.last_activity_at.or(self.started_at)
    }
}
