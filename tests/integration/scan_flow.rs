//! Discovery scan and cache behavior across repeated invocations.

use std::sync::Arc;
use std::time::Duration;

use vigil::model::SessionStatus;
use vigil::monitor::Monitor;
use vigil::process::KernelProbe;
use vigil::scan::{ParseCache, ScanCache, Scanner};
use vigil::workspace::FsResolver;

use super::helpers::{init_workspace, test_config, write_job};

#[test]
fn test_repeated_scans_reuse_the_parse_cache() {
    let (temp, plans) = init_workspace();
    write_job(&plans, "one.md", "j-1", "todo", "oneshot");
    write_job(&plans, "two.md", "j-2", "todo", "oneshot");

    let parse_cache = Arc::new(ParseCache::new());
    let scanner = Scanner::new(
        Arc::new(FsResolver::new(&[temp.path().join("ws")])),
        Arc::new(KernelProbe),
        Arc::clone(&parse_cache),
        4,
    );

    let first = scanner.scan().unwrap();
    assert_eq!(first.len(), 2);
    let parses_after_first = parse_cache.parse_count();
    assert_eq!(parses_after_first, 2);

    let second = scanner.scan().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(
        parse_cache.parse_count(),
        parses_after_first,
        "unchanged files must not be reparsed"
    );
}

#[test]
fn test_cold_start_writes_cache_and_warm_start_reads_it() {
    let (temp, plans) = init_workspace();
    write_job(&plans, "one.md", "j-1", "completed", "oneshot");

    let config = test_config(temp.path());
    let monitor = Monitor::new(&config, false).unwrap();
    let sessions = monitor.sessions().unwrap();
    assert_eq!(sessions.len(), 1);

    // A second monitor (fresh process, conceptually) sees the snapshot
    // without a workspace to scan.
    let mut moved_config = test_config(temp.path());
    moved_config.workspace_roots = vec![temp.path().join("gone")];
    let monitor2 = Monitor::new(&moved_config, false).unwrap();
    let sessions2 = monitor2.sessions().unwrap();
    assert_eq!(sessions2.len(), 1);
    assert_eq!(sessions2[0].id, "j-1");
}

#[test]
fn test_stale_cache_forces_rescan_for_foreground_callers() {
    let (temp, plans) = init_workspace();
    write_job(&plans, "one.md", "j-1", "completed", "oneshot");

    let mut config = test_config(temp.path());
    config.cache_ttl_secs = 0;

    let monitor = Monitor::new(&config, false).unwrap();
    monitor.sessions().unwrap();

    // New job appears; with a zero TTL the snapshot is immediately stale
    // and the next read rescans.
    write_job(&plans, "two.md", "j-2", "todo", "oneshot");
    std::thread::sleep(Duration::from_millis(20));
    let sessions = monitor.sessions().unwrap();
    assert_eq!(sessions.len(), 2);
}

#[test]
fn test_corrupt_cache_degrades_to_full_scan() {
    let (temp, plans) = init_workspace();
    write_job(&plans, "one.md", "j-1", "completed", "oneshot");

    let config = test_config(temp.path());
    std::fs::write(&config.cache_path, "definitely not json").unwrap();

    let monitor = Monitor::new(&config, false).unwrap();
    let sessions = monitor.sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Completed);

    // The scan healed the cache.
    let cache = ScanCache::new(&config.cache_path, Duration::from_secs(60));
    assert_eq!(cache.read(true).unwrap().len(), 1);
}
