//! Read-only inspection of a target, for diagnosing profiles
//!
//! This module provides tools for:
//! - Reading every derived signal and the patch state (`StatusInfo`)
//! - Dumping the capture buffer without draining it (`BufferDump`)

mod dump;
mod status;

pub use dump::{BufferDump, MemoryDump, SlotEntry};
pub use status::{PatchState, StatusInfo};
