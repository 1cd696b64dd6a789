//! Atomic whole-file replacement.
//!
//! The persistent scan cache is shared across processes without any lock:
//! correctness relies on writers replacing the file atomically so a
//! concurrent reader sees either the old snapshot or the new one in full,
//! never a truncated mix.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Distinguishes concurrent writers within one process (the refresh loop
/// and a foreground caller can both replace the scan cache).
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write `content` to a sibling temporary file, then rename it over
/// `path`.
///
/// The temporary name carries our PID and a sequence number so neither
/// another process nor another thread clobbers our scratch file.
pub fn atomic_replace(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = parent.join(format!(".{file_name}.{}.{seq}.tmp", std::process::id()));

    std::fs::write(&tmp, content)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        // Leave no scratch file behind on a failed rename.
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}
