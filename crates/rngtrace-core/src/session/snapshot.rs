use serde::Serialize;

use crate::instrument::TrackerState;
use crate::profile::ProfileSignals;
use crate::stats::DisplayedStats;

/// What one tick observed, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSnapshot {
    pub frame: u64,
    /// Display name of the active profile, `None` when running without one
    pub profile: Option<String>,
    pub tracker: TrackerState,
    pub signals: Option<ProfileSignals>,
    pub all_calls: DisplayedStats,
    pub script_calls: DisplayedStats,
    /// Caller addresses drained on this tick
    pub calls: Vec<u32>,
    pub room_changed: bool,
}

impl TickSnapshot {
    /// Snapshot for a tick where no profile is active
    pub fn no_data(frame: u64, tracker: TrackerState) -> Self {
        Self {
            frame,
            profile: None,
            tracker,
            signals: None,
            all_calls: DisplayedStats::default(),
            script_calls: DisplayedStats::default(),
            calls: Vec::new(),
            room_changed: false,
        }
    }

    pub fn has_data(&self) -> bool {
        self.profile.is_some()
    }
}
