//! A reader racing a writer must never observe a truncated or
//! partially-written cache file.

use std::thread;
use std::time::Duration;

use vigil::model::{Session, SessionKind, SessionStatus};
use vigil::scan::ScanCache;

fn sessions(n: usize) -> Vec<Session> {
    (0..n)
        .map(|i| {
            let mut s = Session::new(
                format!("session-{i}"),
                SessionKind::Oneshot,
                SessionStatus::Running,
            );
            // Bulk the payload so a torn write would be observable.
            s.job.title = Some("x".repeat(512));
            s
        })
        .collect()
}

#[test]
fn test_concurrent_write_and_read_never_sees_partial_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan-cache.json");
    let cache = ScanCache::new(&path, Duration::from_secs(60));

    cache.write(&sessions(50)).unwrap();

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        let cache = ScanCache::new(&writer_path, Duration::from_secs(60));
        for round in 0..100 {
            let n = if round % 2 == 0 { 1 } else { 50 };
            cache.write(&sessions(n)).unwrap();
        }
    });

    let mut observed = 0;
    while !writer.is_finished() {
        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content)
            .expect("reader observed a torn cache file");
        let count = value["sessions"].as_array().unwrap().len();
        assert!(
            count == 1 || count == 50,
            "cache held a mix of two snapshots ({count} sessions)"
        );
        observed += 1;
    }
    writer.join().unwrap();
    assert!(observed > 0);

    // And through the typed read path as well.
    let cache_sessions = cache.read(true).unwrap();
    assert!(cache_sessions.len() == 1 || cache_sessions.len() == 50);
}
