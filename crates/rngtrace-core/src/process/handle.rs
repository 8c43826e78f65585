#![cfg_attr(
    not(any(target_os = "windows", target_os = "linux")),
    allow(dead_code)
)]

use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
use tracing::warn;

#[cfg(target_os = "windows")]
use std::ffi::OsString;
#[cfg(target_os = "windows")]
use std::os::windows::ffi::OsStringExt;
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION,
    PROCESS_VM_READ, PROCESS_VM_WRITE,
};

/// Executable name of the emulator host looked up when no PID is given.
pub const DEFAULT_PROCESS_NAME: &str = "EmuHawk.exe";

/// An open handle to the emulator host process with read/write access to its
/// address space.
#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: HANDLE,
    pub pid: u32,
}

#[cfg(target_os = "linux")]
pub struct ProcessHandle {
    mem: std::fs::File,
    pub pid: u32,
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub struct ProcessHandle {
    pub pid: u32,
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = find_process_id(name).map_err(|e| {
            tracing::debug!("Process detection failed: {}", e);
            e
        })?;
        tracing::debug!("Found {} with PID {}", name, pid);
        Self::open(pid)
    }

    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess is called with valid access flags and a process ID. The returned
        // handle is owned by this struct and closed in Drop.
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_INFORMATION | PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION,
                false,
                pid,
            )
            .map_err(|e| {
                tracing::debug!("OpenProcess failed for PID {}: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?
        };

        Ok(Self { handle, pid })
    }

    pub fn handle(&self) -> HANDLE {
        self.handle
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        let mut exit_code: u32 = 0;
        // SAFETY: GetExitCodeProcess is called with a valid process handle obtained from
        // OpenProcess and a properly initialized out parameter.
        unsafe {
            if GetExitCodeProcess(self.handle, &mut exit_code).is_ok() {
                exit_code == STILL_ACTIVE
            } else {
                false
            }
        }
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: self.handle came from OpenProcess and has not been closed yet.
            if let Err(e) = unsafe { CloseHandle(self.handle) } {
                warn!("Failed to close process handle: {}", e);
            }
        }
    }
}

#[cfg(target_os = "windows")]
fn find_process_id(name: &str) -> Result<u32> {
    // SAFETY: CreateToolhelp32Snapshot with TH32CS_SNAPPROCESS is safe to call.
    // The returned handle is closed at the end of this function.
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessNotFound(e.to_string()))?
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: Process32FirstW and Process32NextW are called with a valid snapshot handle and a
    // properly initialized PROCESSENTRY32W. szExeFile is null-terminated by the API.
    let result = unsafe {
        let mut found = None;
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let len = entry
                    .szExeFile
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szExeFile.len());
                let exe_name = OsString::from_wide(&entry.szExeFile[..len]);

                if exe_name.to_string_lossy().eq_ignore_ascii_case(name) {
                    found = Some(entry.th32ProcessID);
                    break;
                }

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        found.ok_or_else(|| Error::ProcessNotFound(format!("Process '{}' not found", name)))
    };

    // SAFETY: snapshot is a valid handle from CreateToolhelp32Snapshot
    let _ = unsafe { CloseHandle(snapshot) };
    result
}

#[cfg(target_os = "linux")]
impl ProcessHandle {
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = find_process_id(name)?;
        tracing::debug!("Found {} with PID {}", name, pid);
        Self::open(pid)
    }

    pub fn open(pid: u32) -> Result<Self> {
        let mem = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(format!("/proc/{}/mem", pid))
            .map_err(|e| {
                tracing::debug!("Opening /proc/{}/mem failed: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?;

        Ok(Self { mem, pid })
    }

    pub(crate) fn mem(&self) -> &std::fs::File {
        &self.mem
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        std::path::Path::new(&format!("/proc/{}", self.pid)).exists()
    }
}

#[cfg(target_os = "linux")]
fn find_process_id(name: &str) -> Result<u32> {
    // Linux builds of the emulator have no .exe suffix
    let wanted = name.strip_suffix(".exe").unwrap_or(name);

    for entry in std::fs::read_dir("/proc")?.flatten() {
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        // comm is truncated to 15 bytes by the kernel
        let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) else {
            continue;
        };
        let comm = comm.trim();
        let truncated = wanted.get(..15).unwrap_or(wanted);
        if comm.eq_ignore_ascii_case(truncated) {
            return Ok(pid);
        }
    }

    Err(Error::ProcessNotFound(format!(
        "Process '{}' not found",
        name
    )))
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
impl ProcessHandle {
    pub fn find_and_open(_name: &str) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Process access is not supported on this platform".to_string(),
        ))
    }

    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Process access is not supported on this platform".to_string(),
        ))
    }

    /// Check if the process is still running (stub)
    pub fn is_alive(&self) -> bool {
        false
    }
}
