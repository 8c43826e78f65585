//! CLI argument definitions for rngtrace.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rngtrace_core::DEFAULT_PROCESS_NAME;
use rngtrace_core::config::timing::POLL_INTERVAL_MS;

use crate::cli_utils::parse_hex_u64;

/// Hash of the build tracked when none is given
pub const DEFAULT_PROFILE_HASH: &str = "B37AB196";

#[derive(Parser)]
#[command(name = "rngtrace")]
#[command(about = "Live RNG call tracer for emulated games", version)]
pub struct Args {
    /// Emulator process ID (skip lookup by name)
    #[arg(long, env = "RNGTRACE_PID", global = true)]
    pub pid: Option<u32>,

    /// Emulator executable to look for
    #[arg(long, default_value = DEFAULT_PROCESS_NAME, global = true)]
    pub process_name: String,

    /// Host address of the emulated main RAM (hex, e.g. 0x7FF6A0000000)
    #[arg(long, env = "RNGTRACE_RAM_BASE", value_parser = parse_hex_u64, global = true)]
    pub ram_base: Option<u64>,

    /// Profile hash of the running build
    #[arg(
        long,
        env = "RNGTRACE_PROFILE",
        default_value = DEFAULT_PROFILE_HASH,
        global = true
    )]
    pub profile: String,

    /// Load a profile from file and track it instead of --profile
    #[arg(long, value_name = "FILE", global = true)]
    pub profile_file: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = POLL_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Write logs to this file (the live view discards them otherwise)
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List known profiles, or write the selected one out as a profile file
    Profiles {
        /// Output file path
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Read every tracked signal once without installing anything
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the capture buffer without draining it
    Buffer {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
