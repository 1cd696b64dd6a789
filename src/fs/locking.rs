//! Locked file access for job files.
//!
//! Job files are mutated both by the external orchestrator and by vigil's
//! repair path. `fs2` advisory locks keep those writers from interleaving.
//! The locks are cooperative; the orchestrator uses the same discipline.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Read a file under a shared lock.
pub fn locked_read(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to lock {} for reading", path.display()))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content)
}

/// Replace a file's contents under an exclusive lock.
///
/// The file is truncated only after the lock is held, so a reader using
/// `locked_read` can never observe the empty window between truncate and
/// write.
pub fn locked_write(path: &Path, content: &str) -> Result<()> {
    #[allow(clippy::suspicious_open_options)]
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to lock {} for writing", path.display()))?;
    file.set_len(0)
        .with_context(|| format!("Failed to truncate {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.md");

        locked_write(&path, "---\nstatus: running\n---\n").unwrap();
        assert_eq!(locked_read(&path).unwrap(), "---\nstatus: running\n---\n");
    }

    #[test]
    fn test_rewrite_shrinks_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.md");

        locked_write(&path, "a much longer first version").unwrap();
        locked_write(&path, "short").unwrap();
        assert_eq!(locked_read(&path).unwrap(), "short");
    }

    #[test]
    fn test_concurrent_writers_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.md");
        locked_write(&path, "seed").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                thread::spawn(move || locked_write(&path, &format!("writer {i} was here")).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = locked_read(&path).unwrap();
        assert!(content.starts_with("writer "));
        assert!(content.ends_with(" was here"));
    }
}
