use chrono::{DateTime, Local};
use tracing::info;

use crate::config::ExplorerConfig;
use crate::grid::GridView;
use crate::history::CallHistory;
use crate::instrument::Instrumentation;
use crate::stats::StatsAggregator;

/// Everything that belongs to one tracking session.
///
/// Install state, history and both stats instances live together so a
/// restart clears them in one step.
#[derive(Debug)]
pub struct SessionState {
    pub tracker: Instrumentation,
    pub history: CallHistory,
    pub stats: StatsAggregator,
    pub grid: GridView,
    started_at: DateTime<Local>,
}

impl SessionState {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            tracker: Instrumentation::new(),
            history: CallHistory::new(),
            stats: StatsAggregator::new(),
            grid: GridView::new(config.grid_metrics, config.grid_visible),
            started_at: Local::now(),
        }
    }

    /// Clear install state, history and stats. Grid drawing stays as it was.
    pub fn restart(&mut self) {
        self.tracker.reset();
        self.history.clear();
        self.stats.reset();
        self.grid.reset();
        self.started_at = Local::now();
        info!("Session restarted at {}", self.started_at.format("%H:%M:%S"));
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Local::now() - self.started_at
    }
}
