//! Bounded retry with exponential backoff.

use std::thread;
use std::time::Duration;

use tracing::warn;

/// Default number of attempts per request, the first one included.
pub const DEFAULT_ATTEMPTS: u32 = 5;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each failure, capped
    /// at ten seconds.
    pub backoff: Duration,
}

/// Why [`Retry::run`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error; holds the last one.
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error; returned as soon as it happened.
    Fatal(E),
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: Duration::from_millis(500),
        }
    }
}

impl Retry {
    /// No waiting between attempts.
    #[cfg(test)]
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            backoff: Duration::ZERO,
        }
    }

    fn delay(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    /// Run `op` until it succeeds, fails with an error `retryable` rejects, or
    /// the attempt budget is spent.  `op` receives the 1-based attempt number.
    pub fn run<T, E, F, P>(&self, label: &str, mut op: F, retryable: P) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if !retryable(&e) => return Err(RetryError::Fatal(e)),
                Err(e) if attempt >= attempts => {
                    return Err(RetryError::Exhausted { attempts, last: e })
                }
                Err(e) => {
                    warn!(
                        op = label,
                        attempt,
                        left = attempts - attempt,
                        error = %e,
                        "retryable failure"
                    );
                    let delay = self.delay(attempt);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
