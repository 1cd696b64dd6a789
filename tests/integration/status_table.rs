//! The concrete status derivation table, against real files, real lock
//! files and the real kernel probe.

use vigil::model::SessionStatus;
use vigil::monitor::Monitor;
use vigil::process::KernelProbe;
use vigil::scan::{derive_status, ParseCache};

use super::helpers::{init_workspace, test_config, write_job, write_lock};

fn parse(path: &std::path::Path) -> vigil::model::Session {
    ParseCache::new().resolve(path).expect("job should parse")
}

#[test]
fn test_running_oneshot_without_lock_is_interrupted() {
    let (_temp, plans) = init_workspace();
    let path = write_job(&plans, "a.md", "j-a", "running", "oneshot");

    let (status, _) = derive_status(&parse(&path), &KernelProbe);
    assert_eq!(status, SessionStatus::Interrupted);
}

#[test]
fn test_running_oneshot_with_own_pid_lock_is_running() {
    let (_temp, plans) = init_workspace();
    let path = write_job(&plans, "b.md", "j-b", "running", "oneshot");
    write_lock(&path, std::process::id());

    let (status, pid) = derive_status(&parse(&path), &KernelProbe);
    assert_eq!(status, SessionStatus::Running);
    assert_eq!(pid, Some(std::process::id()));
}

#[test]
fn test_running_oneshot_with_dead_pid_lock_is_interrupted() {
    let (_temp, plans) = init_workspace();
    let path = write_job(&plans, "c.md", "j-c", "running", "oneshot");
    write_lock(&path, 999_999_999);

    let (status, _) = derive_status(&parse(&path), &KernelProbe);
    assert_eq!(status, SessionStatus::Interrupted);
}

#[test]
fn test_running_chat_without_lock_stays_running() {
    let (_temp, plans) = init_workspace();
    let path = write_job(&plans, "d.md", "j-d", "running", "chat");

    let (status, _) = derive_status(&parse(&path), &KernelProbe);
    assert_eq!(status, SessionStatus::Running);
}

#[test]
fn test_completed_with_live_lock_stays_completed() {
    let (_temp, plans) = init_workspace();
    let path = write_job(&plans, "e.md", "j-e", "completed", "oneshot");
    write_lock(&path, std::process::id());

    let (status, _) = derive_status(&parse(&path), &KernelProbe);
    assert_eq!(status, SessionStatus::Completed);
}

#[test]
fn test_table_holds_through_the_full_read_path() {
    let (temp, plans) = init_workspace();
    let verified = write_job(&plans, "verified.md", "j-live", "running", "oneshot");
    write_lock(&verified, std::process::id());
    write_job(&plans, "zombie.md", "j-stale", "running", "oneshot");
    write_job(&plans, "done.md", "j-done", "completed", "oneshot");

    let monitor = Monitor::new(&test_config(temp.path()), false).unwrap();
    let sessions = monitor.sessions().unwrap();
    let status_of = |id: &str| sessions.iter().find(|s| s.id == id).unwrap().status;

    assert_eq!(status_of("j-live"), SessionStatus::Running);
    assert_eq!(status_of("j-stale"), SessionStatus::Interrupted);
    assert_eq!(status_of("j-done"), SessionStatus::Completed);
}
