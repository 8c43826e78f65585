//! Common CLI utility functions shared across commands.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use rngtrace_core::{ProcessHandle, ProfileCatalog, TargetProfile, load_profile};
use tracing::info;

/// Parse a hex number with or without `0x` prefix
pub fn parse_hex_u64(value: &str) -> std::result::Result<u64, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{}': {}", value, e))
}

/// Open the emulator process by PID or by executable name.
pub fn open_process(pid: Option<u32>, process_name: &str) -> Result<ProcessHandle> {
    if let Some(pid) = pid {
        Ok(ProcessHandle::open(pid)?)
    } else {
        Ok(ProcessHandle::find_and_open(process_name)?)
    }
}

pub fn require_ram_base(ram_base: Option<u64>) -> Result<u64> {
    ram_base.ok_or_else(|| anyhow!("--ram-base (or RNGTRACE_RAM_BASE) is required"))
}

/// Built-in profiles plus the one from `profile_file`, and the hash to track.
///
/// A profile file takes precedence over `profile_hash`.
pub fn load_catalog(
    profile_file: Option<&Path>,
    profile_hash: &str,
) -> Result<(ProfileCatalog, String)> {
    let catalog = ProfileCatalog::builtin();
    let Some(path) = profile_file else {
        return Ok((catalog, profile_hash.to_string()));
    };

    let profile = match load_profile(path) {
        Ok(profile) => profile,
        Err(e) if e.is_not_found() => {
            bail!("profile file {} does not exist (see `rngtrace profiles --output`)", path.display())
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to load profile from {}", path.display()));
        }
    };
    info!("Loaded profile {} ({}) from {}", profile.name, profile.hash, path.display());
    let hash = profile.hash.clone();
    Ok((catalog.with_profile(profile)?, hash))
}

/// The profile selected by the global options
pub fn resolve_profile(profile_file: Option<&Path>, profile_hash: &str) -> Result<TargetProfile> {
    let (catalog, hash) = load_catalog(profile_file, profile_hash)?;
    match catalog.get(&hash) {
        Some(profile) => Ok(profile.clone()),
        None => bail!("no profile for hash '{}' (see `rngtrace profiles`)", hash),
    }
}
