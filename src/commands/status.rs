//! `vigil status` — dashboard summary.

use anyhow::Result;
use colored::Colorize;

use crate::commands::format_age;
use crate::config::Config;
use crate::model::{Session, SessionStatus};
use crate::monitor::Monitor;

pub fn execute(config: &Config) -> Result<()> {
    let monitor = Monitor::new(config, false)?;
    let sessions = monitor.sessions()?;

    println!("{}", "vigil status".bold().blue());
    println!("{}", "=".repeat(50));

    let running = count(&sessions, SessionStatus::Running);
    let idle = count(&sessions, SessionStatus::Idle) + count(&sessions, SessionStatus::PendingUser);
    let interrupted = count(&sessions, SessionStatus::Interrupted);
    let failed = count(&sessions, SessionStatus::Failed) + count(&sessions, SessionStatus::Error);
    let completed = count(&sessions, SessionStatus::Completed);
    let queued = count(&sessions, SessionStatus::Todo) + count(&sessions, SessionStatus::Hold);

    println!("\n{}", "Sessions".bold());
    println!("  Running:     {}", running.to_string().green().bold());
    println!("  Idle:        {}", idle.to_string().yellow());
    println!("  Interrupted: {}", interrupted.to_string().red());
    println!("  Failed:      {}", failed.to_string().red().bold());
    println!("  Completed:   {completed}");
    println!("  Queued:      {queued}");

    let active: Vec<&Session> = sessions.iter().filter(|s| s.status.is_live()).collect();
    if !active.is_empty() {
        println!("\n{}", "Active".bold());
        for session in active {
            println!(
                "  {} {} ({}, {})",
                "●".green(),
                session.id,
                session.repo.as_deref().unwrap_or("-"),
                format_age(session.activity_key()),
            );
        }
    }

    println!();
    Ok(())
}

fn count(sessions: &[Session], status: SessionStatus) -> usize {
    sessions.iter().filter(|s| s.status == status).count()
}
