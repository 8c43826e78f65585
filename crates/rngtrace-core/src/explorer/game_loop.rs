//! Poll loop driving `Explorer::on_tick` once per host frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::export::format_snapshot_summary;
use crate::process::{ReadMemory, WriteMemory};
use crate::retry::{ExponentialBackoff, RetryStrategy};
use crate::session::TickSnapshot;

use super::Explorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Why the loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was raised
    Shutdown,
    /// The sink asked to stop
    Stopped,
    /// Target memory stopped answering
    Detached,
}

/// Receives every tick's outcome.
///
/// Gets the explorer mutably so a front end can restart the session or
/// scroll the grid between ticks.
pub trait TickSink {
    fn on_tick(&mut self, explorer: &mut Explorer, snapshot: &TickSnapshot) -> LoopControl;

    fn on_error(&mut self, _explorer: &mut Explorer, _error: &Error) -> LoopControl {
        LoopControl::Continue
    }
}

impl Explorer {
    /// Poll until shutdown, detach, or the sink stops.
    pub fn run<M, S>(&mut self, memory: &mut M, shutdown: &AtomicBool, sink: &mut S) -> StopReason
    where
        M: WriteMemory + ?Sized,
        S: TickSink + ?Sized,
    {
        self.run_with_retry(memory, shutdown, sink, &ExponentialBackoff::new())
    }

    pub fn run_with_retry<M, S, R>(
        &mut self,
        memory: &mut M,
        shutdown: &AtomicBool,
        sink: &mut S,
        retry: &R,
    ) -> StopReason
    where
        M: WriteMemory + ?Sized,
        S: TickSink + ?Sized,
        R: RetryStrategy,
    {
        let mut frame: u64 = 0;
        info!("Starting tracking loop...");

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested after {} tick(s)", frame);
                return StopReason::Shutdown;
            }

            if let Err(e) = verify_memory_access(memory, retry) {
                info!("Target detached after {} retries: {}", retry.max_attempts(), e);
                return StopReason::Detached;
            }

            frame += 1;
            let control = match self.on_tick(memory, frame) {
                Ok(snapshot) => {
                    if !snapshot.calls.is_empty() {
                        debug!("{}", format_snapshot_summary(&snapshot));
                    }
                    sink.on_tick(self, &snapshot)
                }
                Err(e) => {
                    if e.is_fatal() {
                        error!("Tracking halted: {}", e);
                    } else {
                        warn!("Tick {} failed: {}", frame, e);
                    }
                    sink.on_error(self, &e)
                }
            };
            if control == LoopControl::Stop {
                return StopReason::Stopped;
            }

            thread::sleep(self.config().poll_interval);
        }
    }
}

fn verify_memory_access<M, R>(memory: &M, retry: &R) -> Result<()>
where
    M: ReadMemory + ?Sized,
    R: RetryStrategy,
{
    retry.execute(|attempt| {
        let result = if memory.is_attached() {
            memory.read_bytes(0, 4).map(|_| ())
        } else {
            Err(Error::ProcessNotFound("target process exited".to_string()))
        };
        if let Err(e) = &result {
            debug!("Memory check failed (attempt {}): {}", attempt + 1, e);
        }
        result
    })
}
