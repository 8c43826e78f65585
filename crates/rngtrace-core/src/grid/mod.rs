//! Virtualized call grid.
//!
//! A leading frame-number column followed by one column per call slot, the
//! newest frame on top. Only the cells inside the viewport are ever built.

mod layout;
mod view;

pub use layout::{Column, Extent, GridCell, GridMetrics, Viewport};
pub use view::{DrawState, GridView};
