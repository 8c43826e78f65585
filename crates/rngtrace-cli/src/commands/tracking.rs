//! Live tracking mode: the header and the call grid on the alternate screen.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use owo_colors::OwoColorize;
use rngtrace_core::config::timing::PROCESS_WAIT_MS;
use rngtrace_core::export::{format_session_clock, format_snapshot_header};
use rngtrace_core::{
    Column, Error, Explorer, ExplorerConfig, GridCell, GridMetrics, LoopControl, ProcessHandle,
    ProcessMemory, StopReason, TickSink, TickSnapshot, Viewport,
};
use tracing::{debug, info, warn};

use crate::cli::Args;
use crate::cli_utils::{load_catalog, open_process, require_ram_base};
use crate::input::{self, Action};
use crate::shutdown::ShutdownSignal;

/// Header lines plus the key help line
const GRID_TOP: u16 = 5;

const KEY_HELP: &str = "arrows/PgUp/PgDn/Home scroll  g grid  r restart  q quit";

/// Run the live tracking mode
pub fn run(args: &Args) -> Result<()> {
    let ram_base = require_ram_base(args.ram_base)?;
    let (catalog, hash) = load_catalog(args.profile_file.as_deref(), &args.profile)?;
    let shutdown = setup_shutdown_handler()?;

    let config = ExplorerConfig {
        poll_interval: Duration::from_millis(args.interval_ms),
        grid_metrics: GridMetrics::terminal(),
        grid_visible: true,
    };
    let mut explorer = Explorer::new(catalog, config);

    println!("rngtrace v{}", env!("CARGO_PKG_VERSION"));
    if !explorer.restart(Some(&hash)) {
        println!(
            "{} no profile for hash '{}', showing no data",
            "warning:".yellow(),
            hash
        );
    }
    println!("Waiting for {}... (Press Ctrl+C to quit)", args.process_name);

    while !shutdown.is_shutdown() {
        if let Some(process) = wait_for_process(args.pid, &args.process_name) {
            match run_session(&mut explorer, &process, ram_base, &hash, &shutdown)? {
                StopReason::Stopped | StopReason::Shutdown => break,
                StopReason::Detached => {
                    println!("Emulator disconnected, waiting for {}...", args.process_name)
                }
            }
            explorer.restart(Some(&hash));
        }

        if shutdown.wait(Duration::from_millis(PROCESS_WAIT_MS)) {
            break;
        }
    }

    println!("Shutdown complete.");
    Ok(())
}

fn setup_shutdown_handler() -> Result<Arc<ShutdownSignal>> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let handler = Arc::clone(&shutdown);
    ctrlc::set_handler(move || handler.trigger()).context("failed to install Ctrl+C handler")?;
    Ok(shutdown)
}

fn wait_for_process(pid: Option<u32>, process_name: &str) -> Option<ProcessHandle> {
    match open_process(pid, process_name) {
        Ok(process) => {
            println!("Connected to {} (PID: {})", process_name, process.pid);
            Some(process)
        }
        Err(e) => {
            debug!("Process not found: {}", e);
            None
        }
    }
}

fn run_session(
    explorer: &mut Explorer,
    process: &ProcessHandle,
    ram_base: u64,
    hash: &str,
    shutdown: &ShutdownSignal,
) -> Result<StopReason> {
    let mut memory = ProcessMemory::new(process, ram_base);
    let reason = {
        let mut view = LiveView::enter(hash)?;
        explorer.run(&mut memory, shutdown.as_atomic(), &mut view)
    };
    info!(
        "Session ended ({:?}) after {} frame row(s)",
        reason,
        explorer.history().len()
    );
    Ok(reason)
}

/// Alternate-screen renderer; restores the terminal on drop.
struct LiveView {
    stdout: Stdout,
    profile_hash: String,
    scroll_x: u64,
    scroll_y: u64,
    last_error: Option<String>,
    force_redraw: bool,
}

impl LiveView {
    fn enter(profile_hash: &str) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self {
            stdout,
            profile_hash: profile_hash.to_string(),
            scroll_x: 0,
            scroll_y: 0,
            last_error: None,
            force_redraw: true,
        })
    }

    fn viewport(&self) -> Result<Viewport> {
        let (cols, rows) = terminal::size()?;
        Ok(Viewport::new(cols as u32, rows.saturating_sub(GRID_TOP) as u32)
            .scrolled(self.scroll_x, self.scroll_y))
    }

    fn apply(&mut self, explorer: &mut Explorer, action: Action) -> Result<LoopControl> {
        let viewport = self.viewport()?;
        let metrics = *explorer.grid().metrics();
        let (row, column, page) = (
            metrics.row_height as u64,
            metrics.column_width as u64,
            viewport.height.max(1) as u64,
        );

        match action {
            Action::ScrollUp => self.scroll_y = self.scroll_y.saturating_sub(row),
            Action::ScrollDown => self.scroll_y += row,
            Action::ScrollLeft => self.scroll_x = self.scroll_x.saturating_sub(column),
            Action::ScrollRight => self.scroll_x += column,
            Action::PageUp => self.scroll_y = self.scroll_y.saturating_sub(page),
            Action::PageDown => self.scroll_y += page,
            Action::Home => (self.scroll_x, self.scroll_y) = (0, 0),
            Action::ToggleGrid => {
                let enabled = explorer.grid().is_draw_enabled();
                explorer.grid_mut().set_draw_enabled(!enabled);
                self.force_redraw = true;
                return Ok(LoopControl::Continue);
            }
            Action::Restart => {
                explorer.restart(Some(&self.profile_hash));
                (self.scroll_x, self.scroll_y) = (0, 0);
                self.last_error = None;
                self.force_redraw = true;
                return Ok(LoopControl::Continue);
            }
            Action::Resize => {
                self.force_redraw = true;
                return Ok(LoopControl::Continue);
            }
            Action::Quit => return Ok(LoopControl::Stop),
        }

        let clamped = explorer
            .grid()
            .clamp_scroll(viewport.scrolled(self.scroll_x, self.scroll_y));
        (self.scroll_x, self.scroll_y) = (clamped.scroll_x, clamped.scroll_y);
        explorer.grid_mut().on_scroll();
        Ok(LoopControl::Continue)
    }

    fn draw(&mut self, explorer: &mut Explorer, snapshot: &TickSnapshot) -> Result<()> {
        let grid_dirty = explorer.grid_mut().take_redraw() || self.force_redraw;

        if self.force_redraw {
            queue!(self.stdout, Clear(ClearType::All))?;
        }

        for (i, line) in format_snapshot_header(snapshot).iter().enumerate() {
            queue!(
                self.stdout,
                MoveTo(0, i as u16),
                Clear(ClearType::UntilNewLine),
                Print(line)
            )?;
        }
        let footer = match &self.last_error {
            Some(message) => message.red().to_string(),
            None => {
                let session = explorer.session();
                format!(
                    "{}  {}",
                    format_session_clock(session.started_at(), session.elapsed()),
                    KEY_HELP.dimmed()
                )
            }
        };
        queue!(
            self.stdout,
            MoveTo(0, GRID_TOP - 1),
            Clear(ClearType::UntilNewLine),
            Print(footer)
        )?;

        if grid_dirty {
            self.draw_grid(explorer)?;
        }

        self.force_redraw = false;
        self.stdout.flush()?;
        Ok(())
    }

    fn draw_grid(&mut self, explorer: &Explorer) -> Result<()> {
        let viewport = self.viewport()?;
        let grid = explorer.grid();
        queue!(self.stdout, MoveTo(0, GRID_TOP), Clear(ClearType::FromCursorDown))?;

        if !grid.is_draw_enabled() {
            queue!(self.stdout, Print("(grid hidden, press g to show)".dimmed()))?;
            return Ok(());
        }

        let margin = grid.metrics().text_margin;
        for cell in grid.render(explorer.history(), viewport) {
            let Some((x, text)) = clip_cell(&cell, margin, viewport.width) else {
                continue;
            };
            let y = GRID_TOP as i64 + cell.y;
            let text = match cell.column {
                Column::Frame => text.dimmed().to_string(),
                Column::Call(_) => text,
            };
            queue!(self.stdout, MoveTo(x, y as u16), Print(text))?;
        }
        Ok(())
    }
}

impl TickSink for LiveView {
    fn on_tick(&mut self, explorer: &mut Explorer, snapshot: &TickSnapshot) -> LoopControl {
        let actions = input::pending_actions().unwrap_or_else(|e| {
            warn!("Failed to read terminal input: {}", e);
            Vec::new()
        });
        for action in actions {
            match self.apply(explorer, action) {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Stop) => return LoopControl::Stop,
                Err(e) => {
                    warn!("Terminal error: {}", e);
                    return LoopControl::Stop;
                }
            }
        }

        if let Err(e) = self.draw(explorer, snapshot) {
            warn!("Failed to draw: {}", e);
            return LoopControl::Stop;
        }
        LoopControl::Continue
    }

    fn on_error(&mut self, explorer: &mut Explorer, error: &Error) -> LoopControl {
        let halted = explorer.session().tracker.is_halted();
        self.last_error = Some(if halted || error.is_fatal() {
            format!("Tracking halted: {} (press r to restart)", error)
        } else {
            error.to_string()
        });
        LoopControl::Continue
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Cell text padded to its width with a right border, clipped to the
/// screen. Returns the starting column and the visible part.
fn clip_cell(cell: &GridCell, margin: u32, screen_width: u32) -> Option<(u16, String)> {
    let inner = cell.width.saturating_sub(1) as usize;
    let body = format!(
        "{}{}",
        " ".repeat(margin as usize),
        cell.text.as_deref().unwrap_or("")
    );
    let full: String = format!("{:<inner$}", body, inner = inner)
        .chars()
        .take(inner)
        .chain(std::iter::once('│'))
        .collect();

    let skip = (-cell.x).max(0) as usize;
    let x = cell.x.max(0);
    if x >= screen_width as i64 {
        return None;
    }
    let room = screen_width as usize - x as usize;
    let visible: String = full.chars().skip(skip).take(room).collect();
    if visible.is_empty() {
        return None;
    }
    Some((x as u16, visible))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i64, text: Option<&str>) -> GridCell {
        GridCell {
            row: 0,
            column: Column::Call(0),
            x,
            y: 0,
            width: 10,
            height: 1,
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_clip_cell_pads_and_borders() {
        let (x, text) = clip_cell(&cell(10, Some("80052F2C")), 1, 80).unwrap();
        assert_eq!(x, 10);
        assert_eq!(text, " 80052F2C│");
    }

    #[test]
    fn test_clip_cell_blank() {
        let (_, text) = clip_cell(&cell(0, None), 1, 80).unwrap();
        assert_eq!(text, "         │");
    }

    #[test]
    fn test_clip_cell_left_edge() {
        let (x, text) = clip_cell(&cell(-4, Some("80052F2C")), 1, 80).unwrap();
        assert_eq!(x, 0);
        assert_eq!(text, "52F2C│");
    }

    #[test]
    fn test_clip_cell_right_edge() {
        let (_, text) = clip_cell(&cell(75, Some("80052F2C")), 1, 80).unwrap();
        assert_eq!(text, " 8005");
        assert!(clip_cell(&cell(80, Some("1")), 1, 80).is_none());
    }
}
