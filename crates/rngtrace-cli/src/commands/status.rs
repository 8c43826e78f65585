//! Status command implementation.

use anyhow::Result;
use rngtrace_core::export::format_byte;
use rngtrace_core::{ProcessMemory, StatusInfo};

use crate::cli::Args;
use crate::cli_utils::{open_process, require_ram_base, resolve_profile};

/// Run the status command
pub fn run(args: &Args, json: bool) -> Result<()> {
    let ram_base = require_ram_base(args.ram_base)?;
    let profile = resolve_profile(args.profile_file.as_deref(), &args.profile)?;

    if !json {
        println!("rngtrace {} - Status Mode", env!("CARGO_PKG_VERSION"));
    }

    let process = open_process(args.pid, &args.process_name)?;
    let memory = ProcessMemory::new(&process, ram_base);
    let status = StatusInfo::collect(&memory, process.pid, ram_base, &profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let check = |ok: bool| if ok { "✓" } else { "✗" };

    println!(
        "Found process (PID: {}, RAM base: 0x{:X})",
        status.pid, status.ram_base
    );
    println!();
    println!("=== Profile ===");
    println!("Name:         {}", status.profile_name);
    println!("Hash:         {}", status.profile_hash);

    println!();
    println!("=== Signals ===");
    let signals = &status.signals;
    println!("Room:         {}", signals.room_id);
    println!(
        "RNG:          {:04X}  {}",
        signals.rng_state,
        if status.rng_at_initial_state {
            "(just initialized)"
        } else {
            ""
        }
    );
    println!("Script RNG:   {:04X}", signals.script_rng_state);
    println!(
        "Offset:       index {} -> {}",
        format_byte(signals.script_rng_offset_index),
        format_byte(signals.script_rng_offset)
    );

    println!();
    println!("=== Tracker ===");
    println!(
        "Redirect:     0x{:06X}  {}",
        profile.rand_function,
        check(status.patch.redirect_present)
    );
    println!(
        "Interceptor:  0x{:06X}  {}",
        profile.patch_address,
        check(status.patch.interceptor_present)
    );
    println!(
        "Installed:    {}",
        if status.patch.is_installed() {
            "YES"
        } else {
            "NO"
        }
    );

    Ok(())
}
