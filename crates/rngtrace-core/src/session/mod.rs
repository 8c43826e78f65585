//! Per-session tracking state.

mod snapshot;
mod state;

pub use snapshot::TickSnapshot;
pub use state::SessionState;
