//! `vigil mark` — manually set a job file's declared status.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::model::SessionStatus;
use crate::parser::{parse_job_file, set_job_status};

pub fn execute(job_file: &Path, status: &str) -> Result<()> {
    let status: SessionStatus = status
        .parse()
        .with_context(|| format!("'{status}' is not a valid status"))?;

    if !job_file.exists() {
        bail!("Job file not found: {}", job_file.display());
    }
    // Refuse to scribble on something that is not a job file.
    let before = parse_job_file(job_file)
        .with_context(|| format!("{} is not a job file", job_file.display()))?;

    set_job_status(job_file, status)?;
    println!(
        "{} {} {} -> {}",
        "✓".green().bold(),
        job_file.display(),
        before.status.to_string().dimmed(),
        status.to_string().bold()
    );
    Ok(())
}
