//! Fixed-delay retry policy
//!
//! One tier only: a constant delay, no exponential growth, no jitter and no
//! circuit breaker.

use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed delay between attempts, and before the next chunk after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Extra attempts after the first; 0 disables retrying
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_retries: 0,
        }
    }
}

/// Result of a retried call plus how many attempts it took
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }

    /// Run `f` until it succeeds, the retries are used up or the error is
    /// one a repeat call cannot fix. `f` receives the 1-based attempt number.
    pub async fn run<F, Fut, T>(&self, mut f: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match f(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Retry succeeded on attempt {}", attempt);
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    if attempt >= max_attempts || !error.is_retryable() {
                        return RetryOutcome {
                            result: Err(error),
                            attempts: attempt,
                        };
                    }

                    warn!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt, error, self.delay
                    );
                    self.pause().await;
                }
            }
        }
    }

    /// Sleep for the fixed delay
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
