//! Mock guest memory for testing
//!
//! Provides an in-memory RAM image implementing both memory traits, so the
//! instrumentation logic can be exercised without a running emulator.

use crate::error::{Error, Result};
use crate::process::{ReadMemory, WriteMemory};

/// Mock guest memory for testing
///
/// Address 0 is the first byte of the buffer. Every write is also recorded
/// so tests can check what was written and in which order.
#[derive(Debug, Clone)]
pub struct MockMemory {
    data: Vec<u8>,
    writes: Vec<(u32, Vec<u8>)>,
    attached: bool,
}

impl MockMemory {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            writes: Vec::new(),
            attached: true,
        }
    }

    /// Create a zero-filled memory of the given size
    pub fn zeroed(size: usize) -> Self {
        Self::new(vec![0; size])
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes performed through `WriteMemory`, oldest first
    pub fn writes(&self) -> &[(u32, Vec<u8>)] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Simulate the target process going away
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Poke bytes directly, bypassing the write log (simulates the target
    /// itself modifying its memory)
    pub fn poke(&mut self, address: u32, bytes: &[u8]) {
        let offset = address as usize;
        if self.data.len() < offset + bytes.len() {
            self.data.resize(offset + bytes.len(), 0);
        }
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn poke_u8(&mut self, address: u32, value: u8) {
        self.poke(address, &[value]);
    }

    pub fn poke_u16(&mut self, address: u32, value: u16) {
        self.poke(address, &value.to_le_bytes());
    }

    pub fn poke_u32(&mut self, address: u32, value: u32) {
        self.poke(address, &value.to_le_bytes());
    }

    fn check_range(&self, address: u32, size: usize) -> std::result::Result<usize, String> {
        let offset = address as usize;
        if offset + size > self.data.len() {
            return Err(format!(
                "Out of bounds: offset={}, size={}, len={}",
                offset,
                size,
                self.data.len()
            ));
        }
        Ok(offset)
    }
}

impl Default for MockMemory {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u32, size: usize) -> Result<Vec<u8>> {
        if !self.attached {
            return Err(Error::MemoryReadFailed {
                address: u64::from(address),
                message: "Mock memory detached".to_string(),
            });
        }
        let offset = self
            .check_range(address, size)
            .map_err(|message| Error::MemoryReadFailed {
                address: u64::from(address),
                message,
            })?;
        Ok(self.data[offset..offset + size].to_vec())
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}

impl WriteMemory for MockMemory {
    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        if !self.attached {
            return Err(Error::MemoryWriteFailed {
                address: u64::from(address),
                message: "Mock memory detached".to_string(),
            });
        }
        let offset = self
            .check_range(address, bytes.len())
            .map_err(|message| Error::MemoryWriteFailed {
                address: u64::from(address),
                message,
            })?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.writes.push((address, bytes.to_vec()));
        Ok(())
    }
}

/// Builder for creating test memory images
///
/// Provides a fluent API for laying out guest RAM for tests.
#[derive(Debug, Clone, Default)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate buffer with zeros up to the specified size
    pub fn with_size(mut self, size: usize) -> Self {
        self.data.resize(size, 0);
        self
    }

    pub fn write_u8(mut self, address: u32, value: u8) -> Self {
        self.put(address, &[value]);
        self
    }

    pub fn write_u16(mut self, address: u32, value: u16) -> Self {
        self.put(address, &value.to_le_bytes());
        self
    }

    pub fn write_u32(mut self, address: u32, value: u32) -> Self {
        self.put(address, &value.to_le_bytes());
        self
    }

    pub fn write_bytes(mut self, address: u32, bytes: &[u8]) -> Self {
        self.put(address, bytes);
        self
    }

    pub fn build(self) -> MockMemory {
        MockMemory::new(self.data)
    }

    fn put(&mut self, address: u32, bytes: &[u8]) {
        let offset = address as usize;
        if self.data.len() < offset + bytes.len() {
            self.data.resize(offset + bytes.len(), 0);
        }
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}
