//! Retry strategies for memory access that may fail transiently.

use std::time::Duration;

use crate::config::retry as retry_config;

/// How many attempts to make and how long to wait between them.
pub trait RetryStrategy {
    /// Total attempts, including the first. Treated as at least 1.
    fn max_attempts(&self) -> u32;

    /// Delay after the given failed attempt (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration>;

    /// Call `f` until it succeeds or attempts run out, returning the last
    /// error in the latter case.
    fn execute<T, E, F>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let max = self.max_attempts().max(1);
        let mut attempt = 0;
        loop {
            match f(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 >= max => return Err(e),
                Err(_) => {
                    if let Some(delay) = self.delay_for_attempt(attempt) {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Backoff using the delays in `config::retry`.
#[derive(Debug, Clone, Default)]
pub struct ExponentialBackoff;

impl ExponentialBackoff {
    pub fn new() -> Self {
        Self
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn max_attempts(&self) -> u32 {
        retry_config::MAX_READ_RETRIES
    }

    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        retry_config::RETRY_DELAYS_MS
            .get(attempt as usize)
            .map(|&ms| Duration::from_millis(ms))
    }
}

/// Single attempt, no waiting.
#[derive(Debug, Clone, Default)]
pub struct NoRetry;

impl NoRetry {
    pub fn new() -> Self {
        Self
    }
}

impl RetryStrategy for NoRetry {
    fn max_attempts(&self) -> u32 {
        1
    }

    fn delay_for_attempt(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}
