//! Process liveness probing.
//!
//! Every status decision in vigil ultimately rests on "does this PID still
//! exist". The probe is a trait so the scan and live-directory code can be
//! exercised in tests without depending on real process tables.

use std::path::Path;

/// Boundary for process-existence checks.
pub trait LivenessProbe: Send + Sync {
    /// Whether a process with this PID currently exists.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probe backed by the kernel: sends the null signal (signal 0), which
/// checks existence without delivering anything.
///
/// `EPERM` means the process exists but is not ours, so it counts as
/// alive; `ESRCH` means no such process.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelProbe;

impl LivenessProbe for KernelProbe {
    fn is_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let pid = match i32::try_from(pid) {
            Ok(v) => v,
            // PIDs above i32::MAX cannot exist
            Err(_) => return false,
        };

        match kill(Pid::from_raw(pid), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

/// Read a PID from a plain-text lock file.
///
/// Lock files hold a single decimal PID (`<jobfile>.lock`, or `pid.lock`
/// inside a live-session directory). Returns `None` when the file is
/// missing, unreadable, or does not contain a positive integer.
pub fn read_lock_pid(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    match content.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Some(pid),
        _ => None,
    }
}
