//! Console output formatting with colored display

use chrono::{DateTime, Duration, Local};
use owo_colors::OwoColorize;

use crate::instrument::TrackerState;
use crate::session::TickSnapshot;
use crate::stats::DisplayedStats;

/// Header lines shown above the call grid.
///
/// Holds a "no data" line in place of signals when no profile is active.
pub fn format_snapshot_header(snapshot: &TickSnapshot) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);

    let profile = snapshot.profile.as_deref().unwrap_or("-");
    lines.push(format!(
        "{} {}  {} {}  {} {}",
        "Profile:".dimmed(),
        profile.bold(),
        "Tracker:".dimmed(),
        format_tracker_state(snapshot.tracker),
        "Frame:".dimmed(),
        snapshot.frame
    ));

    match &snapshot.signals {
        Some(signals) => lines.push(format!(
            "{} {}  {} {}  {} {}  {} {} -> {}",
            "Room:".dimmed(),
            room_label(&signals.room_id, snapshot.room_changed),
            "RNG:".dimmed(),
            format!("{:04X}", signals.rng_state).cyan(),
            "Script RNG:".dimmed(),
            format!("{:04X}", signals.script_rng_state).cyan(),
            "Offset:".dimmed(),
            format_byte(signals.script_rng_offset_index),
            format_byte(signals.script_rng_offset).cyan(),
        )),
        None => lines.push(format!("{}", "No data".dimmed())),
    }

    lines.push(format_stats_row("All calls", &snapshot.all_calls));
    lines.push(format_stats_row("Script calls", &snapshot.script_calls));
    lines
}

fn room_label(room_id: &str, changed: bool) -> String {
    if changed {
        room_id.yellow().bold().to_string()
    } else {
        room_id.yellow().to_string()
    }
}

/// Decimal with the hex value in parentheses, e.g. `31 (1F)`
pub fn format_byte(value: u8) -> String {
    format!("{} ({:02X})", value, value)
}

/// Session start time and how long it has been running
pub fn format_session_clock(started_at: DateTime<Local>, elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    format!(
        "{} {} ({:02}:{:02}:{:02})",
        "Session since".dimmed(),
        started_at.format("%H:%M:%S"),
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    )
}

/// Tracker state with color
pub fn format_tracker_state(state: TrackerState) -> String {
    match state {
        TrackerState::Uninstalled => "waiting".dimmed().to_string(),
        TrackerState::Installed { .. } => "installed".green().to_string(),
        TrackerState::Halted => "halted".red().bold().to_string(),
    }
}

/// One stats row: frame / room / total
pub fn format_stats_row(label: &str, stats: &DisplayedStats) -> String {
    format!(
        "{:<13}{} {:>4}  {} {:>6}  {} {:>8}",
        label,
        "frame".dimmed(),
        format_frame_calls(stats.frame_calls),
        "room".dimmed(),
        stats.room_calls,
        "total".dimmed(),
        stats.total_calls
    )
}

/// Debounced frame count, `-` before anything has been shown
pub fn format_frame_calls(frame_calls: Option<u32>) -> String {
    frame_calls.map_or_else(|| "-".to_string(), |n| n.to_string())
}

/// Uncolored one-line summary for logging
pub fn format_snapshot_summary(snapshot: &TickSnapshot) -> String {
    let room = snapshot
        .signals
        .as_ref()
        .map_or("-", |signals| signals.room_id.as_str());
    format!(
        "frame {} room {} calls {} (script {}) total {}",
        snapshot.frame,
        room,
        snapshot.calls.len(),
        format_frame_calls(snapshot.script_calls.frame_calls),
        snapshot.all_calls.total_calls
    )
}
