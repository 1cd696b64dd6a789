//! `vigil repair` — zombie job detection and repair.
//!
//! Dry-run by default; `--fix` applies the rewrite.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::monitor::Monitor;
use crate::notify::send_desktop_notification;

pub fn execute(config: &Config, fix: bool) -> Result<()> {
    if fix {
        println!("{} Repairing zombie jobs", "→".blue().bold());
    } else {
        println!(
            "{} Dry run - no changes will be made (use {} to apply)",
            "→".blue().bold(),
            "--fix".cyan()
        );
    }

    let monitor = Monitor::new(config, false)?;
    let report = monitor.repair_zombies(!fix)?;

    if report.detected == 0 {
        println!("{} No zombie jobs found", "✓".green().bold());
        return Ok(());
    }

    println!();
    if report.dry_run {
        println!(
            "{} {} zombie job(s) would be marked interrupted",
            "!".yellow().bold(),
            report.detected
        );
    } else {
        println!(
            "{} {} zombie job(s) marked interrupted",
            "✓".green().bold(),
            report.updated
        );
        if report.failed > 0 {
            println!(
                "{} {} file(s) could not be updated",
                "✗".red().bold(),
                report.failed
            );
        }
        if report.updated > 0 {
            send_desktop_notification(
                "vigil repair",
                &format!("{} zombie job(s) marked interrupted", report.updated),
            );
        }
    }

    Ok(())
}
