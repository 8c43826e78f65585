//! Buffer command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use rngtrace_core::{BufferDump, ProcessMemory};

use crate::cli::Args;
use crate::cli_utils::{open_process, require_ram_base, resolve_profile};

/// Show the capture buffer without draining it
pub fn run(args: &Args, json: bool) -> Result<()> {
    let ram_base = require_ram_base(args.ram_base)?;
    let profile = resolve_profile(args.profile_file.as_deref(), &args.profile)?;

    let process = open_process(args.pid, &args.process_name)?;
    let memory = ProcessMemory::new(&process, ram_base);
    let dump = BufferDump::collect(&memory, &profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    println!(
        "Capture buffer 0x{:06X} ({} slots), guard 0x{:06X} = {:08X}",
        dump.address, dump.slot_count, dump.guard_address, dump.guard_word
    );
    println!();
    println!("=== Pending calls ({}) ===", dump.pending.len());
    for slot in &dump.pending {
        let caller = format!("{:08X}", slot.caller);
        if slot.script_call {
            println!("[{:>3}] {}  script", slot.index, caller.cyan());
        } else {
            println!("[{:>3}] {}", slot.index, caller);
        }
    }

    if !dump.stray.is_empty() {
        println!();
        println!(
            "{} {} non-zero slot(s) after the first empty slot",
            "warning:".yellow(),
            dump.stray.len()
        );
        for slot in &dump.stray {
            println!("[{:>3}] {:08X}", slot.index, slot.caller);
        }
    }

    println!();
    println!("=== Raw ===");
    for line in &dump.raw.hex_dump {
        println!("{}", line);
    }

    Ok(())
}
