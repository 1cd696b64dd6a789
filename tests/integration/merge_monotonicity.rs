//! Once a session is merged with a terminal status, no later merge with a
//! stale live-interactive overlay may flip it back to a live state.

use vigil::model::{Session, SessionKind, SessionStatus};
use vigil::reconcile::merge_sessions;

fn stale_live_entry(id: &str) -> Session {
    let mut live = Session::new(id, SessionKind::Code, SessionStatus::Running);
    live.pid = Some(31337);
    live
}

#[test]
fn test_terminal_statuses_survive_repeated_live_overlays() {
    for terminal in [
        SessionStatus::Completed,
        SessionStatus::Failed,
        SessionStatus::Interrupted,
    ] {
        let job = Session::new("x", SessionKind::Oneshot, terminal);

        // First merge establishes the terminal result.
        let mut merged = merge_sessions(Vec::new(), vec![job], vec![stale_live_entry("x")]);
        assert_eq!(merged[0].status, terminal);

        // Feed the result back as the archival baseline a few times, each
        // round with a stale live entry still claiming "running".
        for _ in 0..3 {
            merged = merge_sessions(merged, Vec::new(), vec![stale_live_entry("x")]);
            assert_eq!(merged.len(), 1);
            assert_eq!(merged[0].status, terminal, "terminal state regressed");
            assert_eq!(merged[0].pid, Some(31337), "liveness details still update");
        }
    }
}

#[test]
fn test_job_scan_precedence_over_archival_is_not_monotonic() {
    // The guarantee is specific to live overlays: a job file declaring a
    // live status beats an archival terminal row, because the file is the
    // authority on its own job.
    let archival = vec![Session::new("x", SessionKind::Oneshot, SessionStatus::Completed)];
    let jobs = vec![Session::new("x", SessionKind::Oneshot, SessionStatus::Running)];

    let merged = merge_sessions(archival, jobs, Vec::new());
    assert_eq!(merged[0].status, SessionStatus::Running);
}
