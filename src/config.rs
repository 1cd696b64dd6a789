//! On-disk configuration.
//!
//! Read from `~/.config/vigil/config.toml`. Every field has a default so
//! a missing or partial file just works; an unreadable file falls back to
//! defaults with a warning rather than blocking the tool.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default TTL for the persistent scan cache.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Default background refresh tick.
pub const DEFAULT_TICK_SECS: u64 = 5;

/// Full rescan happens every this many ticks.
pub const DEFAULT_FULL_RESCAN_EVERY: u32 = 6;

/// Grace delay applied before/around orchestrator completion triggers.
pub const DEFAULT_TRIGGER_GRACE_SECS: u64 = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roots whose child directories are workspace nodes.
    pub workspace_roots: Vec<PathBuf>,
    /// Directory of per-session live records (`<id>/pid.lock` + `session.json`).
    pub live_root: PathBuf,
    /// Persistent scan cache file.
    pub cache_path: PathBuf,
    /// Archival SQLite database.
    pub db_path: PathBuf,
    /// Parser worker pool size for the full scan.
    pub scan_workers: usize,
    pub cache_ttl_secs: u64,
    pub tick_secs: u64,
    pub full_rescan_every: u32,
    /// Orchestrator executable invoked with a job-file path when a dead
    /// agent session is found. None disables the trigger.
    pub completion_trigger: Option<PathBuf>,
    pub trigger_grace_secs: u64,
    /// Show completion-trigger output instead of discarding it.
    pub debug_triggers: bool,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vigil");
        Self {
            workspace_roots: vec![PathBuf::from(".")],
            live_root: base.join("live"),
            cache_path: base.join("scan-cache.json"),
            db_path: base.join("archive.db"),
            scan_workers: 8,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            tick_secs: DEFAULT_TICK_SECS,
            full_rescan_every: DEFAULT_FULL_RESCAN_EVERY,
            completion_trigger: None,
            trigger_grace_secs: DEFAULT_TRIGGER_GRACE_SECS,
            debug_triggers: false,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        let Some(config_dir) = dirs::config_dir() else {
            return Self::default();
        };
        Self::load_from(&config_dir.join("vigil").join("config.toml"))
    }

    /// Load from a specific path; missing file means defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring malformed config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Ignoring unreadable config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn trigger_grace(&self) -> Duration {
        Duration::from_secs(self.trigger_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(config.scan_workers, 8);
        assert_eq!(config.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scan_workers = 2\ntick_secs = 1\n").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.scan_workers, 2);
        assert_eq!(config.tick_secs, 1);
        assert_eq!(config.full_rescan_every, DEFAULT_FULL_RESCAN_EVERY);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scan_workers = [not toml").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.scan_workers, 8);
    }
}
