//! Capture buffer dump for debugging

use serde::Serialize;

use crate::error::Result;
use crate::process::ReadMemory;
use crate::profile::{InstrumentationRecipe, TargetProfile};

/// Raw bytes at a guest address
#[derive(Debug, Clone, Serialize)]
pub struct MemoryDump {
    pub address: u32,
    pub size: usize,
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
    pub hex_dump: Vec<String>,
}

impl MemoryDump {
    pub fn new(address: u32, bytes: Vec<u8>) -> Self {
        let hex_dump = format_hex_dump(address, &bytes);
        Self {
            address,
            size: bytes.len(),
            bytes,
            hex_dump,
        }
    }
}

/// One non-empty capture slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEntry {
    pub index: usize,
    pub caller: u32,
    /// Caller with mirror bits stripped
    pub masked: u32,
    pub script_call: bool,
}

/// Snapshot of the capture buffer taken without draining it
#[derive(Debug, Clone, Serialize)]
pub struct BufferDump {
    pub address: u32,
    pub slot_count: usize,
    pub guard_address: u32,
    pub guard_word: u32,
    /// Occupied slots up to the first empty one, as a drain would return them
    pub pending: Vec<SlotEntry>,
    /// Non-zero slots after the first empty one, normally none
    pub stray: Vec<SlotEntry>,
    pub raw: MemoryDump,
}

impl BufferDump {
    /// Read the buffer and guard word. Never writes.
    pub fn collect<M: ReadMemory + ?Sized>(reader: &M, profile: &TargetProfile) -> Result<Self> {
        let buffer = profile.capture_buffer();
        let bytes = reader.read_bytes(buffer.address, buffer.size as usize)?;
        let guard_word = reader.read_u32(buffer.guard_address())?;

        let mut pending = Vec::new();
        let mut stray = Vec::new();
        let mut terminated = false;
        for (index, slot) in bytes.chunks_exact(4).enumerate() {
            let caller = u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]);
            if caller == 0 {
                terminated = true;
                continue;
            }
            let entry = SlotEntry {
                index,
                caller,
                masked: caller & profile.call_address_mask,
                script_call: profile.is_script_call(caller),
            };
            if terminated {
                stray.push(entry);
            } else {
                pending.push(entry);
            }
        }

        Ok(Self {
            address: buffer.address,
            slot_count: buffer.slot_count(),
            guard_address: buffer.guard_address(),
            guard_word,
            pending,
            stray,
            raw: MemoryDump::new(buffer.address, bytes),
        })
    }
}

fn format_hex_dump(address: u32, bytes: &[u8]) -> Vec<String> {
    let bytes_per_line = 16;

    bytes
        .chunks(bytes_per_line)
        .enumerate()
        .map(|(i, chunk)| {
            let addr = address as usize + i * bytes_per_line;
            let hex_part = chunk
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{:08X}  {}", addr, hex_part)
        })
        .collect()
}
