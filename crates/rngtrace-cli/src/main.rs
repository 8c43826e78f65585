mod cli;
mod cli_utils;
mod commands;
mod input;
mod shutdown;

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    match &args.command {
        Some(Command::Profiles { output }) => commands::profiles::run(&args, output.as_deref()),
        Some(Command::Status { json }) => commands::status::run(&args, *json),
        Some(Command::Buffer { json }) => commands::buffer::run(&args, *json),
        None => commands::tracking::run(&args),
    }
}

/// RUST_LOG wins; otherwise warn and above.
///
/// The live view owns the terminal, so its logs go to `--log-file` or nowhere.
fn init_logging(args: &Args) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rngtrace_cli=warn,rngtrace_core=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else if args.command.is_none() {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}
