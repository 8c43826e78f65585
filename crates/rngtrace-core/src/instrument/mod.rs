//! Live instrumentation of the target's RNG routine.
//!
//! The host process cannot observe calls into the routine directly, so a
//! small interceptor is injected that appends each caller's return address
//! to a fixed buffer. The controller installs it once per session and drains
//! the buffer every poll, using the word past the buffer as an overflow
//! guard.

mod controller;

pub use controller::{Instrumentation, TrackerState, scan_slots};
