//! Installing the RNG call tracker and draining what it captured.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::process::WriteMemory;
use crate::profile::{CaptureBuffer, InstrumentationRecipe};

/// Lifecycle of the injected tracker within one session
///
/// `Uninstalled -> Installed -> Halted`. Only a session restart goes back
/// to `Uninstalled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerState {
    #[default]
    Uninstalled,
    /// Patch written; `overflow_sentinel` is the guard word seen at install time
    Installed { overflow_sentinel: u32 },
    /// A fatal error occurred; the capture buffer is no longer trusted
    Halted,
}

#[derive(Debug, Default)]
pub struct Instrumentation {
    state: TrackerState,
}

impl Instrumentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_installed(&self) -> bool {
        matches!(self.state, TrackerState::Installed { .. })
    }

    pub fn is_halted(&self) -> bool {
        self.state == TrackerState::Halted
    }

    /// Back to `Uninstalled`. Only called on session restart.
    pub fn reset(&mut self) {
        self.state = TrackerState::Uninstalled;
    }

    /// Redirect the hooked routine into the interceptor and arm the buffer.
    ///
    /// Writes the redirect, then the interceptor, then zero-fills the capture
    /// buffer, and finally records the guard word past the buffer. Callers
    /// gate this on the tracker being uninstalled.
    ///
    /// If anything after the redirect fails, the hooked routine's original
    /// bytes are written back and the tracker halts.
    pub fn install<R, M>(&mut self, recipe: &R, memory: &mut M) -> Result<()>
    where
        R: InstrumentationRecipe + ?Sized,
        M: WriteMemory + ?Sized,
    {
        let redirect = match recipe.encode_redirect(recipe.interceptor_address()) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Cannot install tracker: {}", e);
                self.state = TrackerState::Halted;
                return Err(e);
            }
        };
        let buffer = recipe.capture_buffer();

        let original = memory.read_bytes(recipe.hook_address(), redirect.len())?;
        memory.write_bytes(recipe.hook_address(), &redirect)?;

        let armed = memory
            .write_bytes(recipe.interceptor_address(), recipe.interceptor_bytes())
            .and_then(|()| memory.fill(buffer.address, buffer.size as usize, 0))
            .and_then(|()| memory.read_u32(buffer.guard_address()));
        let overflow_sentinel = match armed {
            Ok(guard) => guard,
            Err(e) => {
                // The redirect must not outlive a half-written interceptor
                match memory.write_bytes(recipe.hook_address(), &original) {
                    Ok(()) => error!("Tracker install failed, hook restored: {}", e),
                    Err(restore) => error!(
                        "Tracker install failed: {}; restoring hook {:#x} also failed: {}",
                        e,
                        recipe.hook_address(),
                        restore
                    ),
                }
                self.state = TrackerState::Halted;
                return Err(e);
            }
        };
        self.state = TrackerState::Installed { overflow_sentinel };

        info!(
            "Tracker installed: hook {:#x} -> {:#x}, buffer {:#x} ({} slots), guard {:#010x}",
            recipe.hook_address(),
            recipe.interceptor_address(),
            buffer.address,
            buffer.slot_count(),
            overflow_sentinel
        );
        Ok(())
    }

    /// Collect the caller addresses captured since the last drain and clear
    /// the buffer.
    ///
    /// Returns an empty list without touching memory unless installed. A
    /// changed guard word halts the tracker and returns `TrackerOverflow`.
    pub fn drain<R, M>(&mut self, recipe: &R, memory: &mut M) -> Result<Vec<u32>>
    where
        R: InstrumentationRecipe + ?Sized,
        M: WriteMemory + ?Sized,
    {
        let TrackerState::Installed { overflow_sentinel } = self.state else {
            return Ok(Vec::new());
        };
        let buffer = recipe.capture_buffer();

        let guard = memory.read_u32(buffer.guard_address())?;
        if guard != overflow_sentinel {
            self.state = TrackerState::Halted;
            let err = Error::TrackerOverflow {
                guard_address: buffer.guard_address(),
                expected: overflow_sentinel,
                actual: guard,
            };
            error!("{}", err);
            return Err(err);
        }

        let bytes = memory.read_bytes(buffer.address, buffer.size as usize)?;
        let calls = scan_slots(&bytes);
        memory.fill(buffer.address, buffer.size as usize, 0)?;

        if !calls.is_empty() {
            debug!("Drained {} call(s)", calls.len());
        }
        Ok(calls)
    }
}

/// Caller addresses in slot order, up to the first empty slot
pub fn scan_slots(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(CaptureBuffer::SLOT_SIZE as usize)
        .map(|slot| u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]))
        .take_while(|&caller| caller != 0)
        .collect()
}
