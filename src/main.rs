use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vigil::commands::{mark, repair, sessions, status, watch};
use vigil::config::Config;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Local monitor for AI-agent sessions and orchestrator job files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a config file (default: ~/.config/vigil/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all sessions, merged from every source
    Sessions {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a summary dashboard
    Status,

    /// Detect zombie jobs and optionally mark them interrupted
    Repair {
        /// Apply fixes instead of reporting
        #[arg(long)]
        fix: bool,
    },

    /// Continuously watch sessions with background refresh
    Watch {
        /// Seconds between repaints
        #[arg(short, long, default_value_t = 2)]
        interval: u64,
    },

    /// Manually set a job file's declared status
    Mark {
        /// Path to the job file
        job_file: PathBuf,
        /// New status (running, idle, pending_user, completed, failed,
        /// interrupted, error, hold, todo, abandoned)
        status: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Commands::Sessions { json } => sessions::execute(&config, json),
        Commands::Status => status::execute(&config),
        Commands::Repair { fix } => repair::execute(&config, fix),
        Commands::Watch { interval } => watch::execute(&config, interval),
        Commands::Mark { job_file, status } => mark::execute(&job_file, &status),
    }
}
