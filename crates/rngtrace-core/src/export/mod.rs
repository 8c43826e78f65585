//! Formatting of tracking data for display.

mod console;

pub use console::{
    format_byte, format_frame_calls, format_session_clock, format_snapshot_header,
    format_snapshot_summary, format_stats_row, format_tracker_state,
};
