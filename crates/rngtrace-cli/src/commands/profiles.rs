//! Profiles command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use rngtrace_core::{InstrumentationRecipe, save_profile};

use crate::cli::Args;
use crate::cli_utils::load_catalog;

/// List known profiles, or write the selected one to `output`
pub fn run(args: &Args, output: Option<&Path>) -> Result<()> {
    let (catalog, hash) = load_catalog(args.profile_file.as_deref(), &args.profile)?;

    if let Some(path) = output {
        let Some(profile) = catalog.get(&hash) else {
            bail!("no profile for hash '{}'", hash);
        };
        save_profile(path, profile)?;
        println!("Wrote profile {} ({}) to {}", profile.name, profile.hash, path.display());
        return Ok(());
    }

    println!("{:<10} {:<14} {:>8} {:>8} {:>6}", "HASH", "NAME", "RAND", "BUFFER", "SLOTS");
    for profile in catalog.iter() {
        let selected = profile.hash.eq_ignore_ascii_case(hash.trim());
        let line = format!(
            "{:<10} {:<14} {:>8} {:>8} {:>6}",
            profile.hash,
            profile.name,
            format!("{:06X}", profile.rand_function),
            format!("{:06X}", profile.data_address),
            profile.capture_buffer().slot_count()
        );
        if selected {
            println!("{} {}", line.bold(), "*".green());
        } else {
            println!("{}", line);
        }
    }

    Ok(())
}
