mod handle;
mod reader;

// Mock guest memory for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use handle::{DEFAULT_PROCESS_NAME, ProcessHandle};
pub use reader::{ProcessMemory, ReadMemory, WriteMemory};

#[doc(hidden)]
pub use mock::{MockMemory, MockMemoryBuilder};
