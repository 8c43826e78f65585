use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Cannot encode redirect to {target:#010x}: {reason}")]
    PatchEncoding { target: u32, reason: String },

    #[error(
        "Capture buffer overflow: guard word at {guard_address:#x} changed from {expected:#010x} to {actual:#010x}"
    )]
    TrackerOverflow {
        guard_address: u32,
        expected: u32,
        actual: u32,
    },

    #[error("Invalid target profile: {0}")]
    InvalidProfile(String),

    #[error("Profile parse error: {0}")]
    ProfileParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors after which the capture buffer can no longer be trusted for the
    /// rest of the session. Only a restart recovers from these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::PatchEncoding { .. } | Error::TrackerOverflow { .. }
        )
    }

    /// Whether this error is a missing-file IO error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let overflow = Error::TrackerOverflow {
            guard_address: 0x113F4,
            expected: 0,
            actual: 0x8001_0000,
        };
        assert!(overflow.is_fatal());

        let encoding = Error::PatchEncoding {
            target: 0x1000_0000,
            reason: "out of range".to_string(),
        };
        assert!(encoding.is_fatal());

        let read = Error::MemoryReadFailed {
            address: 0x1000,
            message: "boom".to_string(),
        };
        assert!(!read.is_fatal());
    }

    #[test]
    fn test_overflow_message_includes_guard() {
        let err = Error::TrackerOverflow {
            guard_address: 0x113F4,
            expected: 0x1234,
            actual: 0x5678,
        };
        let message = err.to_string();
        assert!(message.contains("0x113f4"));
        assert!(message.contains("0x00001234"));
        assert!(message.contains("0x00005678"));
    }

    #[test]
    fn test_is_not_found() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(err.is_not_found());
        assert!(!Error::ProfileParse("x".to_string()).is_not_found());
    }
}
