//! Archival session store.
//!
//! A local SQLite database keyed by session ID, recording every session
//! vigil has seen. It is the merge baseline: the one source expected to
//! always be available, so read failures here surface as hard errors
//! instead of degrading to empty. Rows are soft-deleted via an `archived`
//! flag; schema migrations are out of scope — bootstrap only.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::model::{Session, SessionKind, SessionStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("archive database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("archive row '{id}' has invalid {field}: {value}")]
    InvalidRow {
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("no archived session with id '{0}'")]
    NotFound(String),
}

pub struct ArchiveStore {
    conn: Connection,
}

impl ArchiveStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            // Best effort; Connection::open reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.bootstrap()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.bootstrap()?;
        Ok(store)
    }

    fn bootstrap(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id               TEXT PRIMARY KEY,
                kind             TEXT NOT NULL,
                status           TEXT NOT NULL,
                pid              INTEGER,
                repo             TEXT,
                branch           TEXT,
                cwd              TEXT,
                started_at       TEXT,
                last_activity_at TEXT,
                ended_at         TEXT,
                plan             TEXT,
                title            TEXT,
                source_path      TEXT,
                worktree         TEXT,
                linked_session   TEXT,
                archived         INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_archived
                ON sessions (archived);
            ",
        )?;
        Ok(())
    }

    /// Insert or replace a session row, preserving its archived flag.
    pub fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        self.conn.execute(
            "
            INSERT INTO sessions (
                id, kind, status, pid, repo, branch, cwd,
                started_at, last_activity_at, ended_at,
                plan, title, source_path, worktree, linked_session
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT (id) DO UPDATE SET
                kind = excluded.kind,
                status = excluded.status,
                pid = excluded.pid,
                repo = excluded.repo,
                branch = excluded.branch,
                cwd = excluded.cwd,
                started_at = excluded.started_at,
                last_activity_at = excluded.last_activity_at,
                ended_at = excluded.ended_at,
                plan = excluded.plan,
                title = excluded.title,
                source_path = excluded.source_path,
                worktree = excluded.worktree,
                linked_session = excluded.linked_session
            ",
            params![
                session.id,
                session.kind.as_str(),
                session.status.as_str(),
                session.pid,
                session.repo,
                session.branch,
                session.cwd.as_ref().map(|p| p.display().to_string()),
                session.started_at.map(|t| t.to_rfc3339()),
                session.last_activity_at.map(|t| t.to_rfc3339()),
                session.ended_at.map(|t| t.to_rfc3339()),
                session.job.plan,
                session.job.title,
                session.job.source_path.as_ref().map(|p| p.display().to_string()),
                session.job.worktree,
                session.job.linked_session_id,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM sessions WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], RawRow::from_row)?;
        match rows.next() {
            Some(raw) => Ok(Some(raw?.into_session()?)),
            None => Ok(None),
        }
    }

    /// All non-archived sessions.
    pub fn get_all(&self) -> Result<Vec<Session>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM sessions WHERE archived = 0"
        ))?;
        let raws: Vec<RawRow> = stmt
            .query_map([], RawRow::from_row)?
            .collect::<Result<_, _>>()?;
        raws.into_iter().map(RawRow::into_session).collect()
    }

    pub fn update_status(&self, id: &str, status: SessionStatus) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE sessions SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Soft-delete: the row stays but leaves every `get_all` result.
    pub fn archive(&self, id: &str) -> Result<(), StoreError> {
        let updated = self
            .conn
            .execute("UPDATE sessions SET archived = 1 WHERE id = ?1", params![id])?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

const COLUMNS: &str = "id, kind, status, pid, repo, branch, cwd, \
     started_at, last_activity_at, ended_at, \
     plan, title, source_path, worktree, linked_session";

/// Plain-typed row, converted to a `Session` after the query so parse
/// failures carry the row id instead of a bare SQL error.
struct RawRow {
    id: String,
    kind: String,
    status: String,
    pid: Option<u32>,
    repo: Option<String>,
    branch: Option<String>,
    cwd: Option<String>,
    started_at: Option<String>,
    last_activity_at: Option<String>,
    ended_at: Option<String>,
    plan: Option<String>,
    title: Option<String>,
    source_path: Option<String>,
    worktree: Option<String>,
    linked_session: Option<String>,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            status: row.get(2)?,
            pid: row.get(3)?,
            repo: row.get(4)?,
            branch: row.get(5)?,
            cwd: row.get(6)?,
            started_at: row.get(7)?,
            last_activity_at: row.get(8)?,
            ended_at: row.get(9)?,
            plan: row.get(10)?,
            title: row.get(11)?,
            source_path: row.get(12)?,
            worktree: row.get(13)?,
            linked_session: row.get(14)?,
        })
    }

    fn into_session(self) -> Result<Session, StoreError> {
        let kind: SessionKind = self.kind.parse().map_err(|_| StoreError::InvalidRow {
            id: self.id.clone(),
            field: "kind",
            value: self.kind.clone(),
        })?;
        let status: SessionStatus = self.status.parse().map_err(|_| StoreError::InvalidRow {
            id: self.id.clone(),
            field: "status",
            value: self.status.clone(),
        })?;

        let parse_ts = |field: &'static str,
                        value: Option<String>|
         -> Result<Option<DateTime<Utc>>, StoreError> {
            value
                .map(|v| {
                    DateTime::parse_from_rfc3339(&v)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|_| StoreError::InvalidRow {
                            id: self.id.clone(),
                            field,
                            value: v,
                        })
                })
                .transpose()
        };

        let mut session = Session::new(self.id.clone(), kind, status);
        session.pid = self.pid;
        session.repo = self.repo;
        session.branch = self.branch;
        session.cwd = self.cwd.map(Into::into);
        session.started_at = parse_ts("started_at", self.started_at)?;
        session.last_activity_at = parse_ts("last_activity_at", self.last_activity_at)?;
        session.ended_at = parse_ts("ended_at", self.ended_at)?;
        session.job.plan = self.plan;
        session.job.title = self.title;
        session.job.source_path = self.source_path.map(Into::into);
        session.job.worktree = self.worktree;
        session.job.linked_session_id = self.linked_session;
        Ok(session)
    }
}
