//! Session controller tying the tracker, stats, history and grid together.

mod game_loop;

pub use game_loop::{LoopControl, StopReason, TickSink};

use tracing::{debug, info, warn};

use crate::config::ExplorerConfig;
use crate::error::Result;
use crate::grid::GridView;
use crate::history::CallHistory;
use crate::instrument::TrackerState;
use crate::process::WriteMemory;
use crate::profile::{ProfileCatalog, TargetProfile};
use crate::session::{SessionState, TickSnapshot};

pub struct Explorer {
    catalog: ProfileCatalog,
    profile: Option<TargetProfile>,
    session: SessionState,
    config: ExplorerConfig,
}

impl Explorer {
    /// Create an explorer with no active profile; call `restart` to pick one.
    pub fn new(catalog: ProfileCatalog, config: ExplorerConfig) -> Self {
        let session = SessionState::new(&config);
        Self {
            catalog,
            profile: None,
            session,
            config,
        }
    }

    /// Start a fresh session for the build identified by `hash`.
    ///
    /// Clears install state, history and stats. An unknown or missing hash
    /// leaves the explorer without a profile, and ticks report no data.
    /// Returns whether a profile is active.
    pub fn restart(&mut self, hash: Option<&str>) -> bool {
        self.session.restart();
        self.profile = hash.and_then(|hash| self.catalog.get(hash)).cloned();

        match (&self.profile, hash) {
            (Some(profile), _) => {
                info!("Tracking {} ({})", profile.name, profile.hash);
                true
            }
            (None, Some(hash)) => {
                warn!("No profile for hash '{}'; running without data", hash);
                false
            }
            (None, None) => {
                warn!("No profile selected; running without data");
                false
            }
        }
    }

    /// Run one poll against target memory.
    ///
    /// Reads the signals, installs the tracker the first time the RNG state
    /// shows the routine was just initialized, otherwise drains it, then
    /// updates stats and grows the grid. `PatchEncoding` and
    /// `TrackerOverflow` are returned as errors and leave the tracker halted;
    /// later ticks still read signals.
    pub fn on_tick<M>(&mut self, memory: &mut M, frame: u64) -> Result<TickSnapshot>
    where
        M: WriteMemory + ?Sized,
    {
        let Self {
            profile, session, ..
        } = self;
        let Some(profile) = profile.as_ref() else {
            return Ok(TickSnapshot::no_data(frame, session.tracker.state()));
        };

        let signals = profile.read_signals(memory)?;

        let calls = match session.tracker.state() {
            TrackerState::Installed { .. } => session.tracker.drain(profile, memory)?,
            TrackerState::Uninstalled if signals.rng_state == profile.initial_rng_state => {
                session.tracker.install(profile, memory)?;
                Vec::new()
            }
            _ => Vec::new(),
        };

        let room_changed = session
            .stats
            .poll(&signals.room_id, &calls, |caller| profile.is_script_call(caller));

        if !calls.is_empty() {
            debug!("Frame {}: {} call(s)", frame, calls.len());
            session.grid.grow(&mut session.history, frame, calls.clone());
        }

        Ok(TickSnapshot {
            frame,
            profile: Some(profile.name.clone()),
            tracker: session.tracker.state(),
            signals: Some(signals),
            all_calls: session.stats.displayed_all(),
            script_calls: session.stats.displayed_script(),
            calls,
            room_changed,
        })
    }

    pub fn profile(&self) -> Option<&TargetProfile> {
        self.profile.as_ref()
    }

    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn history(&self) -> &CallHistory {
        &self.session.history
    }

    pub fn grid(&self) -> &GridView {
        &self.session.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridView {
        &mut self.session.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::process::MockMemory;

    const RAM_SIZE: usize = 0x10_0000;

    fn explorer() -> Explorer {
        let mut explorer = Explorer::new(ProfileCatalog::builtin(), ExplorerConfig::default());
        assert!(explorer.restart(Some("B37AB196")));
        explorer
    }

    fn boot(memory: &mut MockMemory) {
        memory.poke_u16(0x09A928, 0x6CA4);
    }

    #[test]
    fn test_no_profile_degrades_to_no_data() {
        let mut explorer = Explorer::new(ProfileCatalog::builtin(), ExplorerConfig::default());
        assert!(!explorer.restart(Some("00000000")));

        let mut memory = MockMemory::zeroed(RAM_SIZE);
        let snapshot = explorer.on_tick(&mut memory, 1).unwrap();

        assert!(!snapshot.has_data());
        assert!(memory.writes().is_empty());
    }

    #[test]
    fn test_waits_for_initial_rng_state() {
        let mut explorer = explorer();
        let mut memory = MockMemory::zeroed(RAM_SIZE);
        memory.poke_u16(0x09A928, 0x1234);

        let snapshot = explorer.on_tick(&mut memory, 1).unwrap();
        assert_eq!(snapshot.tracker, TrackerState::Uninstalled);
        assert!(memory.writes().is_empty());

        boot(&mut memory);
        let snapshot = explorer.on_tick(&mut memory, 2).unwrap();
        assert!(matches!(snapshot.tracker, TrackerState::Installed { .. }));
        assert!(snapshot.calls.is_empty());
    }

    #[test]
    fn test_installs_only_once() {
        let mut explorer = explorer();
        let mut memory = MockMemory::zeroed(RAM_SIZE);
        boot(&mut memory);

        explorer.on_tick(&mut memory, 1).unwrap();
        let installs = memory.writes().len();
        explorer.on_tick(&mut memory, 2).unwrap();

        // Second tick only zero-fills the buffer after draining
        assert_eq!(memory.writes().len(), installs + 1);
        assert_eq!(memory.writes()[installs].0, 0x0112A8);
    }

    #[test]
    fn test_drained_calls_reach_history_and_stats() {
        let mut explorer = explorer();
        let mut memory = MockMemory::zeroed(RAM_SIZE);
        boot(&mut memory);
        explorer.on_tick(&mut memory, 1).unwrap();

        memory.poke_u32(0x0112A8, 0x8005_2F2C);
        memory.poke_u32(0x0112AC, 0x8003_0010);
        let snapshot = explorer.on_tick(&mut memory, 2).unwrap();

        assert_eq!(snapshot.calls, vec![0x8005_2F2C, 0x8003_0010]);
        assert_eq!(snapshot.all_calls.total_calls, 2);
        assert_eq!(snapshot.script_calls.total_calls, 1);
        assert_eq!(explorer.history().len(), 1);
        assert_eq!(explorer.history().row(0).unwrap().frame, 2);
        assert_eq!(explorer.grid().max_columns(), 2);
    }

    #[test]
    fn test_overflow_halts_and_keeps_reading_signals() {
        let mut explorer = explorer();
        let mut memory = MockMemory::zeroed(RAM_SIZE);
        boot(&mut memory);
        explorer.on_tick(&mut memory, 1).unwrap();

        memory.poke_u32(0x0113F4, 0xFFFF_FFFF);
        let err = explorer.on_tick(&mut memory, 2).unwrap_err();
        assert!(matches!(err, Error::TrackerOverflow { .. }));

        memory.poke_u8(0x0D3218, 0x0A);
        let snapshot = explorer.on_tick(&mut memory, 3).unwrap();
        assert_eq!(snapshot.tracker, TrackerState::Halted);
        assert_eq!(snapshot.signals.unwrap().room_id, "10A");
        assert!(explorer.history().is_empty());
    }

    #[test]
    fn test_restart_reinstalls() {
        let mut explorer = explorer();
        let mut memory = MockMemory::zeroed(RAM_SIZE);
        boot(&mut memory);
        explorer.on_tick(&mut memory, 1).unwrap();
        memory.poke_u32(0x0112A8, 0x8003_0010);
        explorer.on_tick(&mut memory, 2).unwrap();

        assert!(explorer.restart(Some("b37ab196")));
        assert!(explorer.history().is_empty());

        memory.clear_writes();
        let snapshot = explorer.on_tick(&mut memory, 1).unwrap();
        assert!(matches!(snapshot.tracker, TrackerState::Installed { .. }));
        assert_eq!(memory.writes().len(), 3);
        assert_eq!(snapshot.all_calls.total_calls, 0);
    }
}
