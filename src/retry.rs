use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Upper bound on a single backoff delay
pub const MAX_DELAY: Duration = Duration::from_secs(60 * 60);

/// Bounded retry with exponential backoff.
///
/// The delay before attempt `n + 1` is `base_delay * multiplier^(n - 1)`, so with the
/// defaults (3 attempts, 1s, x2) a failing operation waits 1s then 2s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: if multiplier.is_finite() && multiplier > 0.0 {
                multiplier
            } else {
                1.0
            },
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based), capped at
    /// [`MAX_DELAY`]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_DELAY)
            .min(MAX_DELAY)
    }

    /// Sum of all delays a fully failing run would sleep
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts)
            .map(|a| self.delay_after(a))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Run `operation` until it succeeds, returns an error `should_retry` rejects, or the
    /// attempts are exhausted. The last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut, P>(&self, label: &str, mut operation: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            debug!("{} (attempt {}/{})", label, attempt, self.max_attempts);

            let err = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !should_retry(&err) {
                debug!("{} failed with a permanent error: {}", label, err);
                return Err(err);
            }

            warn!(
                "{} failed (attempt {}/{}): {}",
                label, attempt, self.max_attempts, err
            );

            if attempt >= self.max_attempts {
                return Err(err);
            }

            let delay = self.delay_after(attempt);
            debug!("Waiting {:?} before retry", delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}
