//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod buffer;
pub mod profiles;
pub mod status;
pub mod tracking;
