//! Status information for debugging

use serde::Serialize;

use crate::error::Result;
use crate::process::ReadMemory;
use crate::profile::{InstrumentationRecipe, ProfileSignals, TargetProfile};

/// Whether the tracker's code is currently present in target memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchState {
    /// The hooked routine starts with the jump into the interceptor
    pub redirect_present: bool,
    /// The interceptor bytes are in place
    pub interceptor_present: bool,
}

impl PatchState {
    pub fn inspect<R, M>(recipe: &R, reader: &M) -> Result<Self>
    where
        R: InstrumentationRecipe + ?Sized,
        M: ReadMemory + ?Sized,
    {
        let redirect_present = match recipe.encode_redirect(recipe.interceptor_address()) {
            Ok(expected) => reader.read_bytes(recipe.hook_address(), expected.len())? == expected,
            Err(_) => false,
        };

        let interceptor = recipe.interceptor_bytes();
        let interceptor_present =
            reader.read_bytes(recipe.interceptor_address(), interceptor.len())? == interceptor;

        Ok(Self {
            redirect_present,
            interceptor_present,
        })
    }

    pub fn is_installed(&self) -> bool {
        self.redirect_present && self.interceptor_present
    }
}

/// Complete status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    /// Emulator process PID
    pub pid: u32,
    /// Host address of guest RAM
    pub ram_base: u64,
    pub profile_name: String,
    pub profile_hash: String,
    pub signals: ProfileSignals,
    /// RNG state still equals the value it holds right after initialization
    pub rng_at_initial_state: bool,
    pub patch: PatchState,
}

impl StatusInfo {
    /// Collect status information without writing anything
    pub fn collect<M: ReadMemory + ?Sized>(
        reader: &M,
        pid: u32,
        ram_base: u64,
        profile: &TargetProfile,
    ) -> Result<Self> {
        let signals = profile.read_signals(reader)?;

        Ok(Self {
            pid,
            ram_base,
            profile_name: profile.name.clone(),
            profile_hash: profile.hash.clone(),
            rng_at_initial_state: signals.rng_state == profile.initial_rng_state,
            signals,
            patch: PatchState::inspect(profile, reader)?,
        })
    }
}
