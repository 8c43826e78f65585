//! Target profiles.
//!
//! A profile is the per-build address table: where to hook, what to inject,
//! where the capture buffer lives and where the auxiliary signals (RNG state,
//! script RNG, room and stage) can be read. All addresses are offsets into
//! the emulated main RAM.

mod catalog;
mod loader;
mod recipe;

pub use catalog::ProfileCatalog;
pub use loader::{format_profile, load_profile, parse_profile, save_profile};
pub use recipe::{CaptureBuffer, InstrumentationRecipe, RedirectEncoding, encode_mips_j};

use serde::Serialize;

use crate::config::{DEFAULT_CALL_ADDRESS_MASK, DEFAULT_INITIAL_RNG_STATE};
use crate::error::{Error, Result};
use crate::process::ReadMemory;

/// Guest addresses are 32-bit; every span must end at or before this.
const GUEST_ADDRESS_SPACE: u64 = 1 << 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetProfile {
    /// Content-identity key of the running binary
    pub hash: String,
    pub name: String,
    pub rand_function: u32,
    pub patch_address: u32,
    pub patch_bytes: Vec<u8>,
    pub data_address: u32,
    pub data_size: u32,
    pub rng_state: u32,
    pub script_rng_state: u32,
    pub script_rng_offset_index: u32,
    pub script_rng_offsets_base: u32,
    pub script_rng_call_site: u32,
    pub room: u32,
    pub stage: u32,
    /// RNG value right after the game seeds it; the patch is installed when
    /// this is observed.
    pub initial_rng_state: u16,
    pub call_address_mask: u32,
    pub redirect: RedirectEncoding,
}

/// Values read from the auxiliary signal addresses on one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSignals {
    pub room_id: String,
    pub rng_state: u16,
    pub script_rng_state: u16,
    pub script_rng_offset_index: u8,
    pub script_rng_offset: u8,
}

impl TargetProfile {
    /// SLPM-87224 as hashed by the host emulator (a partial hash, so it does
    /// not match a hash of the disc image).
    pub fn slpm_87224() -> Self {
        Self {
            hash: "B37AB196".to_string(),
            name: "SLPM-87224".to_string(),
            rand_function: 0x0102E8,
            // CdComstr, unused during gameplay
            patch_address: 0x083510,
            patch_bytes: vec![
                0x01, 0x80, 0x04, 0x3C, // lui   $a0, 0x8001
                0xA8, 0x12, 0x84, 0x34, // ori   $a0, $a0, 0x12A8
                0x00, 0x00, 0x82, 0x8C, // lw    $v0, 0($a0)
                0x00, 0x00, 0x00, 0x00, // nop
                0xFD, 0xFF, 0x40, 0x14, // bnez  $v0, -3
                0x04, 0x00, 0x84, 0x24, // addiu $a0, 4
                0xFC, 0xFF, 0x9F, 0xAC, // sw    $ra, -4($a0)
                0x09, 0x80, 0x03, 0x3C, // lui   $v1, 0x8009
                0xBC, 0x40, 0x00, 0x08, // j     0x800102F0
                0x28, 0xA9, 0x63, 0x34, // ori   $v1, $v1, 0xA928
            ],
            data_address: 0x0112A8,
            data_size: 332,
            rng_state: 0x09A928,
            script_rng_state: 0x0D3222,
            script_rng_offset_index: 0x0E142E,
            script_rng_offsets_base: 0x09A950,
            script_rng_call_site: 0x052F2C,
            room: 0x0D3218,
            stage: 0x0D3216,
            initial_rng_state: DEFAULT_INITIAL_RNG_STATE,
            call_address_mask: DEFAULT_CALL_ADDRESS_MASK,
            redirect: RedirectEncoding::MipsJ,
        }
    }

    /// Check that the profile can be installed without clobbering itself
    pub fn validate(&self) -> Result<()> {
        if self.patch_bytes.is_empty() {
            return Err(Error::InvalidProfile(format!(
                "{}: patch bytes are empty",
                self.hash
            )));
        }
        if self.data_size == 0 || self.data_size % CaptureBuffer::SLOT_SIZE != 0 {
            return Err(Error::InvalidProfile(format!(
                "{}: data size {} is not a non-zero multiple of {}",
                self.hash,
                self.data_size,
                CaptureBuffer::SLOT_SIZE
            )));
        }

        let buffer = self.capture_buffer().guarded_range();
        let interceptor = span(self.patch_address, self.patch_bytes.len());
        let redirect = span(self.rand_function, self.redirect.len());

        for (what, address, range) in [
            ("capture buffer", self.data_address, &buffer),
            ("patch", self.patch_address, &interceptor),
            ("hooked routine", self.rand_function, &redirect),
        ] {
            if range.end > GUEST_ADDRESS_SPACE {
                return Err(Error::InvalidProfile(format!(
                    "{}: {} at {:#x} runs past the end of the address space",
                    self.hash, what, address
                )));
            }
        }

        if overlaps(&buffer, &interceptor) {
            return Err(Error::InvalidProfile(format!(
                "{}: patch at {:#x} overlaps the capture buffer at {:#x}",
                self.hash, self.patch_address, self.data_address
            )));
        }
        if overlaps(&buffer, &redirect) {
            return Err(Error::InvalidProfile(format!(
                "{}: hooked routine at {:#x} overlaps the capture buffer at {:#x}",
                self.hash, self.rand_function, self.data_address
            )));
        }
        if overlaps(&interceptor, &redirect) {
            return Err(Error::InvalidProfile(format!(
                "{}: hooked routine at {:#x} overlaps the patch at {:#x}",
                self.hash, self.rand_function, self.patch_address
            )));
        }

        Ok(())
    }

    pub fn room_id<M: ReadMemory + ?Sized>(&self, memory: &M) -> Result<String> {
        let stage = memory.read_u8(self.stage)?;
        let room = memory.read_u8(self.room)?;
        Ok(format!("{}{:02X}", u16::from(stage) + 1, room))
    }

    pub fn read_rng_state<M: ReadMemory + ?Sized>(&self, memory: &M) -> Result<u16> {
        memory.read_u16(self.rng_state)
    }

    pub fn read_script_rng_state<M: ReadMemory + ?Sized>(&self, memory: &M) -> Result<u16> {
        memory.read_u16(self.script_rng_state)
    }

    pub fn read_script_rng_offset_index<M: ReadMemory + ?Sized>(&self, memory: &M) -> Result<u8> {
        memory.read_u8(self.script_rng_offset_index)
    }

    /// Entry of the offsets table selected by the current offset index
    pub fn read_script_rng_offset<M: ReadMemory + ?Sized>(&self, memory: &M) -> Result<u8> {
        let index = self.read_script_rng_offset_index(memory)?;
        memory.read_u8(self.script_rng_offsets_base + u32::from(index))
    }

    pub fn read_signals<M: ReadMemory + ?Sized>(&self, memory: &M) -> Result<ProfileSignals> {
        let script_rng_offset_index = self.read_script_rng_offset_index(memory)?;
        let script_rng_offset =
            memory.read_u8(self.script_rng_offsets_base + u32::from(script_rng_offset_index))?;

        Ok(ProfileSignals {
            room_id: self.room_id(memory)?,
            rng_state: self.read_rng_state(memory)?,
            script_rng_state: self.read_script_rng_state(memory)?,
            script_rng_offset_index,
            script_rng_offset,
        })
    }

    /// Whether a captured caller address is the script RNG call site
    pub fn is_script_call(&self, caller: u32) -> bool {
        caller & self.call_address_mask == self.script_rng_call_site
    }
}

impl InstrumentationRecipe for TargetProfile {
    fn hook_address(&self) -> u32 {
        self.rand_function
    }

    fn interceptor_address(&self) -> u32 {
        self.patch_address
    }

    fn encode_redirect(&self, target: u32) -> Result<Vec<u8>> {
        self.redirect.encode(target)
    }

    fn interceptor_bytes(&self) -> &[u8] {
        &self.patch_bytes
    }

    fn capture_buffer(&self) -> CaptureBuffer {
        CaptureBuffer::new(self.data_address, self.data_size)
    }
}

fn span(start: u32, len: usize) -> std::ops::Range<u64> {
    let start = u64::from(start);
    start..start + len as u64
}

fn overlaps(a: &std::ops::Range<u64>, b: &std::ops::Range<u64>) -> bool {
    a.start < b.end && b.start < a.end
}
