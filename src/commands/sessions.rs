//! `vigil sessions` — the merged session list.

use anyhow::Result;
use colored::Colorize;

use crate::commands::format_age;
use crate::config::Config;
use crate::model::{Session, SessionStatus};
use crate::monitor::Monitor;

pub fn execute(config: &Config, json: bool) -> Result<()> {
    let monitor = Monitor::new(config, false)?;
    let sessions = monitor.sessions()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("(no sessions)");
        return Ok(());
    }

    println!(
        "{:<28} {:<18} {:<12} {:<16} {:<8} {}",
        "ID".bold(),
        "STATUS".bold(),
        "KIND".bold(),
        "REPO".bold(),
        "AGE".bold(),
        "TITLE".bold()
    );
    for session in &sessions {
        println!("{}", render_row(session));
    }

    Ok(())
}

fn render_row(session: &Session) -> String {
    let status = colored_status(session.status);
    format!(
        "{:<28} {:<18} {:<12} {:<16} {:<8} {}",
        truncate(&session.id, 27),
        status,
        session.kind.to_string(),
        session.repo.as_deref().unwrap_or("-"),
        format_age(session.activity_key()),
        session.job.title.as_deref().unwrap_or("")
    )
}

fn colored_status(status: SessionStatus) -> String {
    let text = status.to_string();
    match status {
        SessionStatus::Running => text.green().bold().to_string(),
        SessionStatus::Idle | SessionStatus::PendingUser => text.yellow().to_string(),
        SessionStatus::Completed => text.blue().to_string(),
        SessionStatus::Failed | SessionStatus::Error => text.red().bold().to_string(),
        SessionStatus::Interrupted => text.red().to_string(),
        _ => text.dimmed().to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
