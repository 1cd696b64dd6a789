//! `vigil watch` — long-running session view.
//!
//! The one consumer that opts in to background refresh: the progressive
//! refresh engine keeps the scan cache warm while this loop just re-reads
//! and re-renders. Ctrl-C stops the loop and shuts the engine down.

use anyhow::Result;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::commands::format_age;
use crate::config::Config;
use crate::model::SessionStatus;
use crate::monitor::Monitor;

pub fn execute(config: &Config, interval_secs: u64) -> Result<()> {
    let monitor = Monitor::new(config, true)?;
    let interval = Duration::from_secs(interval_secs.max(1));

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })?;
    }

    while !stop.load(Ordering::SeqCst) {
        let sessions = monitor.sessions()?;

        // Clear and repaint.
        print!("\x1B[2J\x1B[H");
        println!(
            "{}  {}",
            "vigil watch".bold().blue(),
            "(ctrl-c to quit)".dimmed()
        );
        println!("{}", "─".repeat(60));
        if sessions.is_empty() {
            println!("(no sessions)");
        }
        for session in &sessions {
            let marker = match session.status {
                SessionStatus::Running => "●".green(),
                SessionStatus::Idle | SessionStatus::PendingUser => "●".yellow(),
                SessionStatus::Failed | SessionStatus::Error | SessionStatus::Interrupted => {
                    "●".red()
                }
                _ => "○".dimmed(),
            };
            println!(
                "{marker} {:<28} {:<14} {:<16} {}",
                session.id,
                session.status.to_string(),
                session.repo.as_deref().unwrap_or("-"),
                format_age(session.activity_key()),
            );
        }

        // Sleep in slices so ctrl-c is snappy.
        let mut remaining = interval;
        while !remaining.is_zero() && !stop.load(Ordering::SeqCst) {
            let step = remaining.min(Duration::from_millis(100));
            std::thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
    }

    monitor.stop();
    println!("\nStopped.");
    Ok(())
}
