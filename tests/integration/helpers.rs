//! Shared fixtures: a throwaway workspace tree with plan directories,
//! job files, live-session records and an isolated config.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use vigil::config::Config;

/// A workspace root with one `app` project containing a plans dir.
pub fn init_workspace() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let plans = temp.path().join("ws").join("app").join("plans");
    fs::create_dir_all(&plans).expect("Failed to create plans dir");
    (temp, plans)
}

/// Config pointing every path at the fixture tree.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.workspace_roots = vec![root.join("ws")];
    config.live_root = root.join("live");
    config.cache_path = root.join("scan-cache.json");
    config.db_path = root.join("archive.db");
    config.scan_workers = 2;
    config
}

/// Write a job file with the given frontmatter fields.
pub fn write_job(plans: &Path, name: &str, id: &str, status: &str, kind: &str) -> PathBuf {
    let path = plans.join(name);
    fs::write(
        &path,
        format!("---\nid: {id}\ntitle: {id}\nstatus: {status}\ntype: {kind}\n---\n\n# {id}\n"),
    )
    .expect("Failed to write job file");
    path
}

/// Write a `<jobfile>.lock` holding the given PID.
pub fn write_lock(job_file: &Path, pid: u32) {
    let mut name = job_file.as_os_str().to_os_string();
    name.push(".lock");
    fs::write(PathBuf::from(name), format!("{pid}\n")).expect("Failed to write lock file");
}

/// Create a live-session record directory linked to a job file.
pub fn write_live_entry(
    live_root: &Path,
    session_id: &str,
    pid: u32,
    kind: &str,
    job_file: Option<&Path>,
) {
    let dir = live_root.join(session_id);
    fs::create_dir_all(&dir).expect("Failed to create live entry");
    fs::write(dir.join("pid.lock"), format!("{pid}\n")).expect("Failed to write pid.lock");

    let mut meta = serde_json::json!({
        "session_id": session_id,
        "pid": pid,
        "working_directory": "/work/app",
        "user": "dev",
        "started_at": "2026-03-01T09:00:00Z",
        "type": kind,
    });
    if let Some(job_file) = job_file {
        meta["job_file_path"] = serde_json::json!(job_file.to_string_lossy());
    }
    fs::write(dir.join("session.json"), meta.to_string()).expect("Failed to write session.json");
}
