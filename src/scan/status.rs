//! Real-time status derivation.
//!
//! A job file's declared status is only trustworthy when it is terminal.
//! A declared live status is a claim that must be proven: lock-file kinds
//! prove it with `<jobfile>.lock` holding a live PID; chat and
//! interactive-agent kinds are tied to a long-lived foreground process
//! with no lock of their own, so their declaration stands.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::model::{Session, SessionStatus};
use crate::process::{read_lock_pid, LivenessProbe};

/// Path of the companion lock file for a job file.
pub fn lock_path(job_file: &Path) -> PathBuf {
    let mut name = OsString::from(job_file.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Derive the effective status (and backing PID) of one job session.
///
/// Terminal declared statuses are returned as-is. For declared live
/// statuses, lock-file kinds resolve to `running` when the lock holds a
/// live PID and `interrupted` when the lock is missing, unreadable,
/// unparseable, or the process is dead.
pub fn derive_status(job: &Session, probe: &dyn LivenessProbe) -> (SessionStatus, Option<u32>) {
    if job.status.is_terminal() {
        return (job.status, job.pid);
    }

    if !job.kind.uses_lock_file() {
        return (job.status, job.pid);
    }

    let Some(source) = job.job.source_path.as_deref() else {
        // Not file-backed; nothing to verify against.
        return (job.status, job.pid);
    };

    match read_lock_pid(&lock_path(source)) {
        Some(pid) if probe.is_alive(pid) => (SessionStatus::Running, Some(pid)),
        _ => (SessionStatus::Interrupted, None),
    }
}

/// Re-verify every non-terminal session in place.
pub fn verify_sessions(sessions: &mut [Session], probe: &dyn LivenessProbe) {
    for session in sessions.iter_mut() {
        if session.status.is_terminal() {
            continue;
        }
        let (status, pid) = derive_status(session, probe);
        session.status = status;
        if pid.is_some() {
            session.pid = pid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SessionKind;
    use std::path::Path;

    struct FixedProbe(bool);

    impl LivenessProbe for FixedProbe {
        fn is_alive(&self, _pid: u32) -> bool {
            self.0
        }
    }

    fn job(kind: SessionKind, status: SessionStatus, source: Option<&Path>) -> Session {
        let mut session = Session::new("j-1", kind, status);
        session.job.source_path = source.map(Path::to_path_buf);
        session
    }

    #[test]
    fn test_lock_path_appends_suffix() {
        assert_eq!(
            lock_path(Path::new("/plans/job.md")),
            PathBuf::from("/plans/job.md.lock")
        );
    }

    #[test]
    fn test_running_oneshot_without_lock_is_interrupted() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("job.md");
        std::fs::write(&source, "x").unwrap();

        let job = job(SessionKind::Oneshot, SessionStatus::Running, Some(&source));
        let (status, pid) = derive_status(&job, &FixedProbe(true));
        assert_eq!(status, SessionStatus::Interrupted);
        assert_eq!(pid, None);
    }

    #[test]
    fn test_running_oneshot_with_live_lock_is_running() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("job.md");
        std::fs::write(&source, "x").unwrap();
        std::fs::write(lock_path(&source), format!("{}\n", std::process::id())).unwrap();

        let job = job(SessionKind::Oneshot, SessionStatus::Running, Some(&source));
        let (status, pid) = derive_status(&job, &crate::process::KernelProbe);
        assert_eq!(status, SessionStatus::Running);
        assert_eq!(pid, Some(std::process::id()));
    }

    #[test]
    fn test_running_oneshot_with_dead_pid_is_interrupted() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("job.md");
        std::fs::write(&source, "x").unwrap();
        std::fs::write(lock_path(&source), "999999\n").unwrap();

        let job = job(SessionKind::Oneshot, SessionStatus::Running, Some(&source));
        let (status, _) = derive_status(&job, &FixedProbe(false));
        assert_eq!(status, SessionStatus::Interrupted);
    }

    #[test]
    fn test_unparseable_lock_is_interrupted() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("job.md");
        std::fs::write(&source, "x").unwrap();
        std::fs::write(lock_path(&source), "pid=123").unwrap();

        let job = job(SessionKind::Agent, SessionStatus::Running, Some(&source));
        let (status, _) = derive_status(&job, &FixedProbe(true));
        assert_eq!(status, SessionStatus::Interrupted);
    }

    #[test]
    fn test_running_chat_without_lock_stays_running() {
        let job = job(SessionKind::Chat, SessionStatus::Running, None);
        let (status, _) = derive_status(&job, &FixedProbe(false));
        assert_eq!(status, SessionStatus::Running);
    }

    #[test]
    fn test_completed_with_live_lock_stays_completed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("job.md");
        std::fs::write(&source, "x").unwrap();
        std::fs::write(lock_path(&source), format!("{}", std::process::id())).unwrap();

        let job = job(SessionKind::Oneshot, SessionStatus::Completed, Some(&source));
        let (status, _) = derive_status(&job, &crate::process::KernelProbe);
        assert_eq!(status, SessionStatus::Completed);
    }

    #[test]
    fn test_verify_sessions_touches_only_live_entries() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("job.md");
        std::fs::write(&source, "x").unwrap();

        let mut sessions = vec![
            job(SessionKind::Oneshot, SessionStatus::Running, Some(&source)),
            job(SessionKind::Oneshot, SessionStatus::Failed, Some(&source)),
        ];
        verify_sessions(&mut sessions, &FixedProbe(true));
        assert_eq!(sessions[0].status, SessionStatus::Interrupted);
        assert_eq!(sessions[1].status, SessionStatus::Failed);
    }
}
