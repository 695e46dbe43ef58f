//! # Exponential Backoff
//!
//! Bounded exponential backoff with jitter, used for the initial API server probe.
//! The first call to the API server may fail while networking or credentials settle,
//! so it is retried a fixed number of steps before giving up.
//!
//! Default sequence: 1s, 1.5s, 2.25s, 3.375s, ... (10 attempts), each delay
//! extended by up to 10% random jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Exponential backoff parameters
///
/// `steps` is the total number of attempts; there are `steps - 1` delays between them.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    /// Delay before the second attempt
    pub initial: Duration,
    /// Multiplier applied to the delay after each attempt
    pub factor: f64,
    /// Fraction of the delay added as random jitter (0.1 = up to +10%)
    pub jitter: f64,
    /// Maximum number of attempts
    pub steps: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 1.5,
            jitter: 0.1,
            steps: 10,
        }
    }
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(initial: Duration, factor: f64, jitter: f64, steps: u32) -> Self {
        Self {
            initial,
            factor,
            jitter,
            steps,
        }
    }

    /// Base delay (without jitter) after the given zero-indexed failed attempt.
    ///
    /// Stateless; `delay_for_attempt(0)` is `initial`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::from_secs_f64(self.initial.as_secs_f64() * self.factor.powi(exponent))
    }

    /// Jittered delays between attempts, `steps - 1` of them.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial,
            factor: self.factor,
            jitter: self.jitter,
            remaining: self.steps.saturating_sub(1),
        }
    }
}

/// Iterator over the jittered delays of an `ExponentialBackoff`
#[derive(Debug, Clone)]
pub struct Delays {
    next: Duration,
    factor: f64,
    jitter: f64,
    remaining: u32,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let base = self.next;
        self.next = Duration::from_secs_f64(base.as_secs_f64() * self.factor);
        Some(jittered(base, self.jitter))
    }
}

/// `base` extended by a random amount in `[0, jitter * base)`.
fn jittered(base: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return base;
    }
    let extra: f64 = rand::thread_rng().gen_range(0.0..jitter);
    base + Duration::from_secs_f64(base.as_secs_f64() * extra)
}

/// Runs `operation` until it succeeds or the backoff is exhausted.
///
/// Returns the last error when every attempt failed. At least one attempt is
/// always made, even with `steps == 0`.
pub async fn retry_with_backoff<F, Fut, T, E>(
    backoff: &ExponentialBackoff,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delays = backoff.delays();
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    warn!(
                        operation = %operation_name,
                        retries = attempt,
                        "Operation succeeded only after retrying"
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                let Some(delay) = delays.next() else {
                    error!(
                        operation = %operation_name,
                        attempts = attempt + 1,
                        error = %e,
                        "Operation failed, giving up"
                    );
                    return Err(e);
                };
                debug!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
