//! Frame, room and session call counters.

use serde::Serialize;
use tracing::info;

/// Call counts for one scope (all RNG calls, or script RNG calls only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallStats {
    /// Calls drained on the latest poll
    pub frame_calls: u32,
    /// Calls since the last room change
    pub room_calls: u64,
    /// Calls since the session started
    pub total_calls: u64,
}

impl CallStats {
    fn record(&mut self, calls: u32) {
        self.frame_calls = calls;
        self.room_calls = self.room_calls.saturating_add(u64::from(calls));
        self.total_calls = self.total_calls.saturating_add(u64::from(calls));
    }
}

/// What the presentation layer shows for one scope.
///
/// `frame_calls` is `None` until the first value is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayedStats {
    pub frame_calls: Option<u32>,
    pub room_calls: u64,
    pub total_calls: u64,
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    all: CallStats,
    script: CallStats,
    last_room: Option<String>,
    /// Set after a single zero-call poll that has not been shown yet
    zero_pending: bool,
    shown_all_frame: Option<u32>,
    shown_script_frame: Option<u32>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one poll.
    ///
    /// A room change resets both room counters before this poll's calls are
    /// added. Returns whether the room changed.
    pub fn poll<F>(&mut self, room_id: &str, calls: &[u32], is_script: F) -> bool
    where
        F: Fn(u32) -> bool,
    {
        let room_changed = self.observe_room(room_id);

        let all_calls = calls.len() as u32;
        let script_calls = calls.iter().filter(|&&caller| is_script(caller)).count() as u32;
        self.all.record(all_calls);
        self.script.record(script_calls);

        self.update_display();
        room_changed
    }

    fn observe_room(&mut self, room_id: &str) -> bool {
        match &self.last_room {
            Some(last) if last == room_id => false,
            Some(last) => {
                info!("Room changed: {} -> {}", last, room_id);
                self.last_room = Some(room_id.to_string());
                self.all.room_calls = 0;
                self.script.room_calls = 0;
                true
            }
            None => {
                self.last_room = Some(room_id.to_string());
                false
            }
        }
    }

    /// The target simulates at half the host poll rate, so a single zero
    /// poll is usually a frame where it did not run. Only a second zero in a
    /// row is shown.
    fn update_display(&mut self) {
        if self.all.frame_calls == 0 && !self.zero_pending {
            self.zero_pending = true;
        } else {
            self.shown_all_frame = Some(self.all.frame_calls);
            self.shown_script_frame = Some(self.script.frame_calls);
            self.zero_pending = false;
        }
    }

    /// Counters for every RNG call
    pub fn all(&self) -> CallStats {
        self.all
    }

    /// Counters for calls from the script RNG call site
    pub fn script(&self) -> CallStats {
        self.script
    }

    pub fn current_room(&self) -> Option<&str> {
        self.last_room.as_deref()
    }

    pub fn displayed_all(&self) -> DisplayedStats {
        DisplayedStats {
            frame_calls: self.shown_all_frame,
            room_calls: self.all.room_calls,
            total_calls: self.all.total_calls,
        }
    }

    pub fn displayed_script(&self) -> DisplayedStats {
        DisplayedStats {
            frame_calls: self.shown_script_frame,
            room_calls: self.script.room_calls,
            total_calls: self.script.total_calls,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT_SITE: u32 = 0x52F2C;

    fn is_script(caller: u32) -> bool {
        caller & 0x3F_FFFF == SCRIPT_SITE
    }

    fn calls(n: usize) -> Vec<u32> {
        vec![0x8003_0000; n]
    }

    #[test]
    fn test_debounce_first_zero_suppressed() {
        let mut stats = StatsAggregator::new();
        let mut shown = Vec::new();

        for n in [3, 0, 0, 5] {
            stats.poll("101", &calls(n), is_script);
            shown.push(stats.displayed_all().frame_calls.unwrap());
        }

        assert_eq!(shown, vec![3, 3, 0, 5]);
        assert_eq!(stats.all().total_calls, 8);
        assert_eq!(stats.all().frame_calls, 5);
    }

    #[test]
    fn test_debounce_nothing_shown_until_second_zero() {
        let mut stats = StatsAggregator::new();

        stats.poll("101", &[], is_script);
        assert_eq!(stats.displayed_all().frame_calls, None);

        stats.poll("101", &[], is_script);
        assert_eq!(stats.displayed_all().frame_calls, Some(0));
    }

    #[test]
    fn test_debounce_alternating_zeros_keep_last_value() {
        let mut stats = StatsAggregator::new();
        let mut shown = Vec::new();

        for n in [4, 0, 2, 0, 6] {
            stats.poll("101", &calls(n), is_script);
            shown.push(stats.displayed_all().frame_calls.unwrap());
        }

        assert_eq!(shown, vec![4, 4, 2, 2, 6]);
    }

    #[test]
    fn test_debounce_applies_to_script_display() {
        let mut stats = StatsAggregator::new();
        stats.poll("101", &[0x8005_2F2C], is_script);
        stats.poll("101", &[], is_script);

        assert_eq!(stats.displayed_script().frame_calls, Some(1));
        assert_eq!(stats.script().frame_calls, 0);
    }

    #[test]
    fn test_room_calls_reset_once_on_transition() {
        let mut stats = StatsAggregator::new();

        assert!(!stats.poll("R1", &calls(2), is_script));
        assert!(!stats.poll("R1", &calls(3), is_script));
        assert_eq!(stats.all().room_calls, 5);

        assert!(stats.poll("R2", &calls(4), is_script));
        assert_eq!(stats.all().room_calls, 4);
        assert_eq!(stats.all().total_calls, 9);
        assert_eq!(stats.current_room(), Some("R2"));
    }

    #[test]
    fn test_room_change_resets_script_room_calls() {
        let mut stats = StatsAggregator::new();
        stats.poll("R1", &[0x8005_2F2C, 0x8005_2F2C], is_script);
        assert_eq!(stats.script().room_calls, 2);

        stats.poll("R2", &[], is_script);
        assert_eq!(stats.script().room_calls, 0);
        assert_eq!(stats.script().total_calls, 2);
    }

    #[test]
    fn test_script_calls_counted_by_masked_address() {
        let mut stats = StatsAggregator::new();
        stats.poll(
            "101",
            &[0x8005_2F2C, 0x0005_2F2C, 0x8005_2F30, 0xA005_2F2C],
            is_script,
        );

        assert_eq!(stats.all().frame_calls, 4);
        assert_eq!(stats.script().frame_calls, 3);
    }

    #[test]
    fn test_counters_saturate() {
        let mut stats = StatsAggregator::new();
        stats.poll("R1", &calls(1), is_script);
        stats.all.room_calls = u64::MAX - 1;
        stats.all.total_calls = u64::MAX - 1;

        stats.poll("R1", &calls(5), is_script);

        assert_eq!(stats.all().frame_calls, 5);
        assert_eq!(stats.all().room_calls, u64::MAX);
        assert_eq!(stats.all().total_calls, u64::MAX);
    }

    #[test]
    fn test_reset() {
        let mut stats = StatsAggregator::new();
        stats.poll("R1", &calls(3), is_script);
        stats.reset();

        assert_eq!(stats.all(), CallStats::default());
        assert_eq!(stats.displayed_all(), DisplayedStats::default());
        assert_eq!(stats.current_room(), None);
    }
}
