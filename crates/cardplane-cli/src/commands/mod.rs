pub mod check;
pub mod completions;
pub mod reconcile;
pub mod shuffle;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["♠", "♥", "♦", "♣"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn spin_done(pb: &ProgressBar, ok: bool, msg: &str) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    let mark = if ok { "✓" } else { "✗" };
    pb.finish_with_message(format!("{mark} {msg}"));
}

pub fn colorize_outcome(outcome: &str) -> String {
    use console::Style;
    match outcome {
        "created" => Style::new().green().apply_to(outcome).to_string(),
        "updated" => Style::new().yellow().apply_to(outcome).to_string(),
        "up-to-date" => Style::new().cyan().apply_to(outcome).to_string(),
        "deleted" => Style::new().dim().apply_to(outcome).to_string(),
        "failed" => Style::new().red().bold().apply_to(outcome).to_string(),
        other => other.to_owned(),
    }
}

/// Red suits in red, black suits as-is.
pub fn colorize_face(face: &str) -> String {
    use console::Style;
    if face.starts_with('♥') || face.starts_with('♦') {
        Style::new().red().apply_to(face).to_string()
    } else {
        face.to_owned()
    }
}
