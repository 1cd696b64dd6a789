//! Zombie detection against real job files and live-session records.

use vigil::model::SessionStatus;
use vigil::monitor::Monitor;
use vigil::parser::parse_job_file;

use super::helpers::{init_workspace, test_config, write_job, write_live_entry};

#[test]
fn test_backed_chat_job_is_left_alone() {
    let (temp, plans) = init_workspace();
    let job = write_job(&plans, "chat.md", "j-chat", "running", "chat");
    let live_root = temp.path().join("live");
    // Our own PID keeps the live session alive for the whole test.
    write_live_entry(&live_root, "sess-1", std::process::id(), "chat", Some(&job));

    let monitor = Monitor::new(&test_config(temp.path()), false).unwrap();
    let report = monitor.repair_zombies(false).unwrap();
    assert_eq!(report.detected, 0);
    assert_eq!(
        parse_job_file(&job).unwrap().status,
        SessionStatus::Running,
        "backed job untouched"
    );
}

#[test]
fn test_unbacked_job_is_repaired_idempotently() {
    let (temp, plans) = init_workspace();
    let job = write_job(&plans, "agent.md", "j-agent", "running", "interactive_agent");

    let monitor = Monitor::new(&test_config(temp.path()), false).unwrap();

    let report = monitor.repair_zombies(false).unwrap();
    assert_eq!(report.detected, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(parse_job_file(&job).unwrap().status, SessionStatus::Interrupted);

    // Second run with no intervening change: zero updates.
    let report = monitor.repair_zombies(false).unwrap();
    assert_eq!(report.detected, 0);
    assert_eq!(report.updated, 0);
}

#[test]
fn test_dry_run_reports_without_touching_files() {
    let (temp, plans) = init_workspace();
    let job = write_job(&plans, "chat.md", "j-chat", "running", "chat");

    let monitor = Monitor::new(&test_config(temp.path()), false).unwrap();
    let report = monitor.repair_zombies(true).unwrap();
    assert_eq!(report.detected, 1);
    assert!(report.dry_run);
    assert_eq!(parse_job_file(&job).unwrap().status, SessionStatus::Running);
}

#[test]
fn test_lock_file_kinds_are_not_zombie_candidates() {
    let (temp, plans) = init_workspace();
    // A oneshot with no lock is handled by status derivation, not the
    // zombie detector; its file must not be rewritten.
    let job = write_job(&plans, "task.md", "j-task", "running", "oneshot");

    let monitor = Monitor::new(&test_config(temp.path()), false).unwrap();
    let report = monitor.repair_zombies(false).unwrap();
    assert_eq!(report.detected, 0);
    assert_eq!(parse_job_file(&job).unwrap().status, SessionStatus::Running);
}
