//! Configuration constants and runtime settings.
//!
//! This module contains:
//! - Polling and process-wait timing
//! - Memory access retry configuration
//! - MIPS redirect encoding constants
//! - `ExplorerConfig` for the tracking loop

use std::time::Duration;

use crate::grid::GridMetrics;

/// Timing constants for the poll loop.
pub mod timing {
    /// Interval between ticks (one host frame at 60 Hz).
    pub const POLL_INTERVAL_MS: u64 = 16;

    /// Delay between attempts to find the emulator process.
    pub const PROCESS_WAIT_MS: u64 = 2000;
}

/// Memory access retry configuration.
///
/// Exponential backoff: 20ms → 40ms → 80ms = 140ms max before the process
/// is considered gone.
pub mod retry {
    /// Maximum number of attempts for the liveness check.
    pub const MAX_READ_RETRIES: u32 = 4;

    /// Delay (in ms) after each failed attempt.
    pub const RETRY_DELAYS_MS: [u64; 3] = [20, 40, 80];
}

/// MIPS `j` instruction encoding.
pub mod mips {
    /// Primary opcode 2 (`j`) in bits 31..26.
    pub const J_OPCODE: u32 = 0x0800_0000;

    /// Field holding `target >> 2`.
    pub const J_TARGET_MASK: u32 = 0x03FF_FFFF;

    /// Bytes reachable by a `j` without changing the upper four PC bits.
    pub const J_REGION_SIZE: u32 = 0x1000_0000;
}

/// RNG state the tracked routine holds right after initialization.
pub const DEFAULT_INITIAL_RNG_STATE: u16 = 0x6CA4;

/// Strips the KSEG/mirror bits from a captured return address.
pub const DEFAULT_CALL_ADDRESS_MASK: u32 = 0x003F_FFFF;

/// Settings for the tracking loop.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub poll_interval: Duration,
    pub grid_metrics: GridMetrics,
    /// Whether the call grid starts out drawing.
    pub grid_visible: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(timing::POLL_INTERVAL_MS),
            grid_metrics: GridMetrics::default(),
            grid_visible: true,
        }
    }
}
