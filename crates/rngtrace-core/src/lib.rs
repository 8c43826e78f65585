//! # rngtrace-core
//!
//! Core library for tracing calls to an emulated game's RNG routine.
//!
//! This crate provides:
//! - Guest memory access (live emulator process or in-memory mock)
//! - Target profiles describing where the RNG routine and its signals live
//! - Installing the call tracker and draining its capture buffer
//! - Per-frame call history, call statistics and a virtualized call grid
//! - The per-tick session controller and poll loop
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables read-only inspection of a target (signal status,
//!   capture buffer dumps). Intended for the CLI's diagnostic commands.

pub mod config;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod error;
pub mod explorer;
pub mod export;
pub mod grid;
pub mod history;
pub mod instrument;
pub mod process;
pub mod profile;
pub mod retry;
pub mod session;
pub mod stats;

// Re-export from config module
pub use config::ExplorerConfig;

// Re-export from error module
pub use error::{Error, Result};

// Re-export from explorer module
pub use explorer::{Explorer, LoopControl, StopReason, TickSink};

// Re-export from grid module
pub use grid::{Column, DrawState, Extent, GridCell, GridMetrics, GridView, Viewport};

pub use history::{CallHistory, FrameCalls};

pub use instrument::{Instrumentation, TrackerState};

// Re-export from process module
pub use process::{DEFAULT_PROCESS_NAME, ProcessHandle, ProcessMemory, ReadMemory, WriteMemory};

// Re-export from profile module
pub use profile::{
    CaptureBuffer, InstrumentationRecipe, ProfileCatalog, ProfileSignals, RedirectEncoding,
    TargetProfile, format_profile, load_profile, parse_profile, save_profile,
};

pub use retry::{ExponentialBackoff, NoRetry, RetryStrategy};

// Re-export from session module
pub use session::{SessionState, TickSnapshot};

pub use stats::{CallStats, DisplayedStats, StatsAggregator};

// Debug utilities (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use debug::{BufferDump, MemoryDump, PatchState, SlotEntry, StatusInfo};
