//! Instrumentation recipes
//!
//! A recipe says where the redirect goes, how it is encoded, which
//! interceptor bytes to place, and where the interceptor records callers.
//! Target profiles are pure data and implement this trait, so supporting a
//! new build never needs a new code path in the controller.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::config::mips;
use crate::error::{Error, Result};

/// Contiguous region the interceptor appends caller addresses to, followed
/// by a guard word that must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureBuffer {
    pub address: u32,
    pub size: u32,
}

impl CaptureBuffer {
    pub const SLOT_SIZE: u32 = 4;

    pub fn new(address: u32, size: u32) -> Self {
        Self { address, size }
    }

    /// Number of caller-address slots
    pub fn slot_count(&self) -> usize {
        (self.size / Self::SLOT_SIZE) as usize
    }

    /// Address of the word immediately past the buffer
    pub fn guard_address(&self) -> u32 {
        self.address + self.size
    }

    /// Address range covered by the slots and the guard word
    pub fn guarded_range(&self) -> std::ops::Range<u64> {
        let start = u64::from(self.address);
        start..start + u64::from(self.size) + u64::from(Self::SLOT_SIZE)
    }
}

/// How the redirect instruction at the hooked routine is encoded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RedirectEncoding {
    /// MIPS `j target`: `(target >> 2)` ORed into opcode 2.
    #[default]
    MipsJ,
}

impl RedirectEncoding {
    /// Size of the encoded redirect in bytes
    pub fn len(&self) -> usize {
        match self {
            RedirectEncoding::MipsJ => 4,
        }
    }

    pub fn encode(&self, target: u32) -> Result<Vec<u8>> {
        match self {
            RedirectEncoding::MipsJ => encode_mips_j(target),
        }
    }
}

/// Encode a MIPS `j` to an absolute target inside the low 256 MiB region.
pub fn encode_mips_j(target: u32) -> Result<Vec<u8>> {
    if target % 4 != 0 {
        return Err(Error::PatchEncoding {
            target,
            reason: "jump target is not word-aligned".to_string(),
        });
    }
    if target >= mips::J_REGION_SIZE {
        return Err(Error::PatchEncoding {
            target,
            reason: format!(
                "jump target is outside the reachable {:#x}-byte region",
                mips::J_REGION_SIZE
            ),
        });
    }

    let word = mips::J_OPCODE | ((target >> 2) & mips::J_TARGET_MASK);
    Ok(word.to_le_bytes().to_vec())
}

/// The capability the instrumentation controller needs from a target.
pub trait InstrumentationRecipe {
    /// Address of the routine whose first instruction is replaced
    fn hook_address(&self) -> u32;

    /// Where the interceptor is placed
    fn interceptor_address(&self) -> u32;

    /// Encode a redirect from the hook to `target`
    fn encode_redirect(&self, target: u32) -> Result<Vec<u8>>;

    fn interceptor_bytes(&self) -> &[u8];

    fn capture_buffer(&self) -> CaptureBuffer;
}
