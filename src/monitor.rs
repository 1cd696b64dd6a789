//! The monitor facade: the one object consumers construct.
//!
//! Wires the resolver, probe, caches, scanner, live scanner, archive
//! store and refresh engine together, and exposes the read path every
//! command uses. Scheduling state ("has the loop started", "is background
//! refresh on") lives on this instance, never in process-wide globals.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::live::{LiveScanner, OrchestratorTrigger};
use crate::model::Session;
use crate::process::{KernelProbe, LivenessProbe};
use crate::reconcile::merge_sessions;
use crate::scan::{ParseCache, RefreshEngine, ScanCache, Scanner};
use crate::store::ArchiveStore;
use crate::workspace::FsResolver;
use crate::zombie::{self, RepairReport};

pub struct Monitor {
    store: ArchiveStore,
    live: LiveScanner,
    scanner: Arc<Scanner>,
    scan_cache: Arc<ScanCache>,
    engine: RefreshEngine,
    background: bool,
}

impl Monitor {
    /// Build a monitor from configuration.
    ///
    /// `background` opts in to the progressive refresh loop; short-lived
    /// command invocations pass false, long-running consumers true.
    pub fn new(config: &Config, background: bool) -> Result<Self> {
        let probe: Arc<dyn LivenessProbe> = Arc::new(KernelProbe);
        let resolver = Arc::new(FsResolver::new(&config.workspace_roots));
        let parse_cache = Arc::new(ParseCache::new());
        let scanner = Arc::new(Scanner::new(
            resolver,
            Arc::clone(&probe),
            parse_cache,
            config.scan_workers,
        ));
        let scan_cache = Arc::new(ScanCache::new(&config.cache_path, config.cache_ttl()));

        let engine = RefreshEngine::new(
            Arc::clone(&scanner),
            Arc::clone(&scan_cache),
            Arc::clone(&probe),
            config.tick(),
            config.full_rescan_every,
            background,
        );

        let trigger = Arc::new(OrchestratorTrigger::new(
            config.completion_trigger.clone(),
            config.trigger_grace(),
            config.debug_triggers,
        ));
        let live = LiveScanner::new(&config.live_root, probe, trigger);

        let store = ArchiveStore::open(&config.db_path)
            .with_context(|| format!("Failed to open archive {}", config.db_path.display()))?;

        Ok(Self {
            store,
            live,
            scanner,
            scan_cache,
            engine,
            background,
        })
    }

    /// The merged session list — the single read path.
    ///
    /// The archive is the one source that must be available; its failure
    /// is a hard error. Job scan and live scan degrade to empty.
    pub fn sessions(&self) -> Result<Vec<Session>> {
        let archival = self
            .store
            .get_all()
            .context("Failed to read the archive store")?;
        let jobs = self.job_sessions()?;
        let live = self.live.scan(Some(&self.store)).unwrap_or_default();
        Ok(merge_sessions(archival, jobs, live))
    }

    /// Job sessions with stale-while-revalidate semantics.
    ///
    /// With background refresh on, any cached snapshot is served
    /// immediately and the refresh loop keeps it converging. Without it,
    /// a fresh snapshot is served as-is and a stale or missing one forces
    /// a blocking full scan.
    pub fn job_sessions(&self) -> Result<Vec<Session>> {
        if self.background {
            if let Some(sessions) = self.scan_cache.read(true) {
                self.engine.start();
                return Ok(sessions);
            }
        } else if let Some(sessions) = self.scan_cache.read(false) {
            return Ok(sessions);
        }

        let sessions = self.scanner.scan()?;
        if let Err(e) = self.scan_cache.write(&sessions) {
            tracing::warn!("Could not persist scan cache: {e:#}");
        }
        if self.background {
            self.engine.start();
        }
        Ok(sessions)
    }

    /// Detect and optionally repair zombie jobs.
    pub fn repair_zombies(&self, dry_run: bool) -> Result<RepairReport> {
        let jobs = self.scanner.scan()?;
        let live = self.live.scan(Some(&self.store)).unwrap_or_default();
        let zombies = zombie::detect(&live, &jobs);
        let report = zombie::repair(&zombies, dry_run);

        // Repaired files changed on disk; refresh the snapshot so the
        // next read reflects it.
        if !dry_run && report.updated > 0 {
            if let Ok(sessions) = self.scanner.scan() {
                let _ = self.scan_cache.write(&sessions);
            }
        }
        Ok(report)
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Stop the background refresh loop, if it was started.
    pub fn stop(&self) {
        self.engine.stop();
    }
}
