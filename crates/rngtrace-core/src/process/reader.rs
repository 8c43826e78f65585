#![cfg_attr(
    not(any(target_os = "windows", target_os = "linux")),
    allow(dead_code, unused_variables)
)]

use crate::error::{Error, Result};
use crate::process::ProcessHandle;

#[cfg(target_os = "linux")]
use std::os::unix::fs::FileExt;

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};

/// Trait for reading guest memory
///
/// Addresses are offsets into the emulated machine's main RAM. Implementations
/// map them onto wherever that RAM actually lives.
pub trait ReadMemory {
    /// Read raw bytes from memory at the given address
    fn read_bytes(&self, address: u32, size: usize) -> Result<Vec<u8>>;

    /// Whether the memory source is still reachable
    fn is_attached(&self) -> bool {
        true
    }

    fn read_u8(&self, address: u32) -> Result<u8> {
        let bytes = self.read_bytes(address, 1)?;
        Ok(bytes[0])
    }

    /// Read a little-endian unsigned 16-bit integer
    fn read_u16(&self, address: u32) -> Result<u16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian unsigned 32-bit integer
    fn read_u32(&self, address: u32) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian signed 32-bit integer
    fn read_i32(&self, address: u32) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Trait for writing guest memory
pub trait WriteMemory: ReadMemory {
    /// Write raw bytes to memory at the given address
    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()>;

    fn write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Fill `len` bytes starting at `address` with `value`
    fn fill(&mut self, address: u32, len: usize, value: u8) -> Result<()> {
        self.write_bytes(address, &vec![value; len])
    }
}

/// Guest RAM inside a live emulator process.
///
/// `ram_base` is the host address where the emulated main RAM starts.
pub struct ProcessMemory<'a> {
    process: &'a ProcessHandle,
    ram_base: u64,
}

impl<'a> ProcessMemory<'a> {
    pub fn new(process: &'a ProcessHandle, ram_base: u64) -> Self {
        Self { process, ram_base }
    }

    pub fn ram_base(&self) -> u64 {
        self.ram_base
    }

    fn host_address(&self, address: u32) -> u64 {
        self.ram_base + u64::from(address)
    }

    #[cfg(target_os = "windows")]
    fn read_bytes_impl(&self, address: u32, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;

        // SAFETY: ReadProcessMemory is called with a handle opened with PROCESS_VM_READ, a
        // destination buffer of exactly `size` bytes and an out parameter for the count.
        // Invalid source addresses make the call fail, which is mapped to an error.
        unsafe {
            ReadProcessMemory(
                self.process.handle(),
                self.host_address(address) as *const _,
                buffer.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
            .map_err(|e| Error::MemoryReadFailed {
                address: u64::from(address),
                message: e.to_string(),
            })?;
        }

        // All-or-nothing: a short read means the address range is not fully mapped
        if bytes_read != size {
            return Err(Error::MemoryReadFailed {
                address: u64::from(address),
                message: format!("Expected {} bytes, read {}", size, bytes_read),
            });
        }

        Ok(buffer)
    }

    #[cfg(target_os = "windows")]
    fn write_bytes_impl(&self, address: u32, bytes: &[u8]) -> Result<()> {
        let mut bytes_written = 0;

        // SAFETY: WriteProcessMemory is called with a handle opened with PROCESS_VM_WRITE |
        // PROCESS_VM_OPERATION and a source slice that outlives the call.
        unsafe {
            WriteProcessMemory(
                self.process.handle(),
                self.host_address(address) as *const _,
                bytes.as_ptr() as *const _,
                bytes.len(),
                Some(&mut bytes_written),
            )
            .map_err(|e| Error::MemoryWriteFailed {
                address: u64::from(address),
                message: e.to_string(),
            })?;
        }

        if bytes_written != bytes.len() {
            return Err(Error::MemoryWriteFailed {
                address: u64::from(address),
                message: format!("Expected {} bytes, wrote {}", bytes.len(), bytes_written),
            });
        }

        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn read_bytes_impl(&self, address: u32, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.process
            .mem()
            .read_exact_at(&mut buffer, self.host_address(address))
            .map_err(|e| Error::MemoryReadFailed {
                address: u64::from(address),
                message: e.to_string(),
            })?;
        Ok(buffer)
    }

    #[cfg(target_os = "linux")]
    fn write_bytes_impl(&self, address: u32, bytes: &[u8]) -> Result<()> {
        self.process
            .mem()
            .write_all_at(bytes, self.host_address(address))
            .map_err(|e| Error::MemoryWriteFailed {
                address: u64::from(address),
                message: e.to_string(),
            })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    fn read_bytes_impl(&self, address: u32, _size: usize) -> Result<Vec<u8>> {
        Err(Error::MemoryReadFailed {
            address: u64::from(address),
            message: "memory access not supported on this platform".to_string(),
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    fn write_bytes_impl(&self, address: u32, _bytes: &[u8]) -> Result<()> {
        Err(Error::MemoryWriteFailed {
            address: u64::from(address),
            message: "memory access not supported on this platform".to_string(),
        })
    }
}

impl ReadMemory for ProcessMemory<'_> {
    fn read_bytes(&self, address: u32, size: usize) -> Result<Vec<u8>> {
        self.read_bytes_impl(address, size)
    }

    fn is_attached(&self) -> bool {
        self.process.is_alive()
    }
}

impl WriteMemory for ProcessMemory<'_> {
    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        self.write_bytes_impl(address, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockMemory;

    #[test]
    fn test_read_u8() {
        let memory = MockMemory::new(vec![0xAB, 0xCD]);
        assert_eq!(memory.read_u8(1).unwrap(), 0xCD);
    }

    #[test]
    fn test_read_u16() {
        let memory = MockMemory::new(vec![0xA4, 0x6C]);
        assert_eq!(memory.read_u16(0).unwrap(), 0x6CA4);
    }

    #[test]
    fn test_read_u32() {
        let memory = MockMemory::new(vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(memory.read_u32(0).unwrap(), 0x12345678);
    }

    #[test]
    fn test_read_i32_negative() {
        let memory = MockMemory::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(memory.read_i32(0).unwrap(), -1);
    }

    #[test]
    fn test_read_out_of_bounds() {
        let memory = MockMemory::new(vec![0x01, 0x02]);
        assert!(memory.read_u32(0).is_err());
    }

    #[test]
    fn test_write_u32_then_read() {
        let mut memory = MockMemory::zeroed(8);
        memory.write_u32(4, 0xDEADBEEF).unwrap();
        assert_eq!(memory.read_bytes(4, 4).unwrap(), vec![0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn test_fill() {
        let mut memory = MockMemory::new(vec![0xFF; 8]);
        memory.fill(2, 4, 0).unwrap();
        assert_eq!(
            memory.read_bytes(0, 8).unwrap(),
            vec![0xFF, 0xFF, 0, 0, 0, 0, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_write_out_of_bounds() {
        let mut memory = MockMemory::zeroed(4);
        assert!(memory.write_bytes(2, &[1, 2, 3]).is_err());
    }
}
