//! CLI command implementations.

pub mod mark;
pub mod repair;
pub mod sessions;
pub mod status;
pub mod watch;

use chrono::{DateTime, Utc};

/// Compact "how long ago" rendering for activity columns.
pub(crate) fn format_age(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return "-".to_string();
    };
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0);
    match seconds {
        0..=59 => format!("{seconds}s"),
        60..=3599 => format!("{}m", seconds / 60),
        3600..=86_399 => format!("{}h", seconds / 3600),
        _ => format!("{}d", seconds / 86_400),
    }
}
