//! Desktop notification support.
//!
//! Used when a repair batch actually fixed something, so a human notices
//! interrupted work without watching the terminal. Uses notify-send on
//! Linux and osascript on macOS. Best-effort: failures are logged and
//! never propagated.

use std::process::Command;
use tracing::debug;

pub fn send_desktop_notification(title: &str, body: &str) {
    let result = if cfg!(target_os = "macos") {
        send_macos(title, body)
    } else {
        send_linux(title, body)
    };

    if let Err(e) = result {
        debug!("Desktop notification failed: {e}");
    }
}

fn send_linux(title: &str, body: &str) -> Result<(), String> {
    Command::new("notify-send")
        .arg("--app-name=vigil")
        .arg(title)
        .arg(body)
        .output()
        .map_err(|e| format!("notify-send failed: {e}"))
        .and_then(|output| {
            if output.status.success() {
                Ok(())
            } else {
                Err(format!("notify-send exited with: {}", output.status))
            }
        })
}

fn send_macos(title: &str, body: &str) -> Result<(), String> {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        body.replace('"', r#"\""#),
        title.replace('"', r#"\""#)
    );

    Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .map_err(|e| format!("osascript failed: {e}"))
        .and_then(|output| {
            if output.status.success() {
                Ok(())
            } else {
                Err(format!("osascript exited with: {}", output.status))
            }
        })
}
