//! Bounded retry with linear backoff for outbound HTTP calls.
//!
//! Every collaborator call (getFile, file download, image upload,
//! sendMessage) goes through one [`RetryPolicy`]. An attempt is repeated only
//! when its error reports [`Retryable::is_retryable`]; the delay before retry
//! `n` is `base_delay * n`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::HttpConfig;
use crate::error::Retryable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Treated as at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A policy that never repeats an attempt.
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(http: &HttpConfig) -> Self {
        Self::new(
            http.retry_max_attempts,
            Duration::from_millis(http.retry_base_delay_ms),
        )
    }

    /// Delay slept after the given failed attempt (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. The closure receives the 1-indexed attempt number.
    /// The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &'static str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= max_attempts || !e.is_retryable() {
                        return Err(e);
                    }
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}
