//! Progressive background refresh.
//!
//! Long-running consumers opt in to a background loop that keeps the
//! persistent scan cache warm: a cheap fast tier re-verifies only the
//! non-terminal cached sessions every tick, and a slow tier replaces the
//! cache with a full rescan every few ticks. Short-lived invocations
//! never start the loop — the process would exit before it paid off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::model::Session;
use crate::process::LivenessProbe;
use crate::scan::cache::ScanCache;
use crate::scan::discover::Scanner;
use crate::scan::status::derive_status;

pub struct RefreshEngine {
    scanner: Arc<Scanner>,
    cache: Arc<ScanCache>,
    probe: Arc<dyn LivenessProbe>,
    tick: Duration,
    full_rescan_every: u32,
    enabled: bool,
    started: AtomicBool,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshEngine {
    pub fn new(
        scanner: Arc<Scanner>,
        cache: Arc<ScanCache>,
        probe: Arc<dyn LivenessProbe>,
        tick: Duration,
        full_rescan_every: u32,
        enabled: bool,
    ) -> Self {
        Self {
            scanner,
            cache,
            probe,
            tick,
            full_rescan_every: full_rescan_every.max(1),
            enabled,
            started: AtomicBool::new(false),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Whether the background loop has been started.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Start the background loop. At most one loop per engine; repeated
    /// calls and disabled engines are no-ops.
    pub fn start(&self) {
        if !self.enabled || self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let scanner = Arc::clone(&self.scanner);
        let cache = Arc::clone(&self.cache);
        let probe = Arc::clone(&self.probe);
        let shutdown = Arc::clone(&self.shutdown);
        let tick = self.tick;
        let full_every = self.full_rescan_every;

        let handle = thread::Builder::new()
            .name("vigil-refresh".to_string())
            .spawn(move || {
                // Immediate lightweight pass so a freshly started watcher
                // is accurate before the first tick elapses.
                fast_refresh(&cache, probe.as_ref());

                let mut ticks: u32 = 0;
                loop {
                    sleep_interruptible(tick, &shutdown);
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    ticks = ticks.wrapping_add(1);
                    if ticks % full_every == 0 {
                        full_refresh(&scanner, &cache);
                    } else {
                        fast_refresh(&cache, probe.as_ref());
                    }
                }
            });

        match handle {
            Ok(handle) => {
                *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
            }
            Err(e) => {
                warn!("Failed to start refresh loop: {e}");
                self.started.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Signal the loop to stop and wait for it to exit.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = handle.join();
        }
    }

    /// Run one fast-tier pass synchronously. The background loop calls
    /// this; tests and callers that want a deterministic refresh can too.
    pub fn fast_refresh_once(&self) {
        fast_refresh(&self.cache, self.probe.as_ref());
    }

    /// Run one slow-tier (full rescan) pass synchronously.
    pub fn full_refresh_once(&self) {
        full_refresh(&self.scanner, &self.cache);
    }
}

impl Drop for RefreshEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Re-verify the non-terminal sessions already in the cache, concurrently,
/// and write the snapshot back. Terminal sessions pass through untouched.
fn fast_refresh(cache: &ScanCache, probe: &dyn LivenessProbe) {
    let Some(mut sessions) = cache.read(true) else {
        return;
    };

    let updates: Mutex<Vec<(usize, crate::model::SessionStatus, Option<u32>)>> =
        Mutex::new(Vec::new());
    thread::scope(|scope| {
        for (idx, session) in sessions.iter().enumerate() {
            if session.status.is_terminal() {
                continue;
            }
            let updates = &updates;
            scope.spawn(move || {
                let (status, pid) = derive_status(session, probe);
                updates
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((idx, status, pid));
            });
        }
    });

    for (idx, status, pid) in updates.into_inner().unwrap_or_else(|e| e.into_inner()) {
        apply_update(&mut sessions, idx, status, pid);
    }

    if let Err(e) = cache.write(&sessions) {
        warn!("Fast refresh could not write scan cache: {e:#}");
    }
}

fn apply_update(
    sessions: &mut [Session],
    idx: usize,
    status: crate::model::SessionStatus,
    pid: Option<u32>,
) {
    let session = &mut sessions[idx];
    session.status = status;
    if pid.is_some() {
        session.pid = pid;
    }
}

/// Full rescan replacing the cache wholesale.
fn full_refresh(scanner: &Scanner, cache: &ScanCache) {
    match scanner.scan() {
        Ok(sessions) => {
            if let Err(e) = cache.write(&sessions) {
                warn!("Full refresh could not write scan cache: {e:#}");
            }
        }
        Err(e) => debug!("Full refresh scan failed: {e:#}"),
    }
}

/// Sleep in small slices so `stop()` does not wait out a whole tick.
fn sleep_interruptible(total: Duration, shutdown: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(50);
    let mut remaining = total;
    while !remaining.is_zero() {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(SLICE);
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}
