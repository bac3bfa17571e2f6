use std::future::Future;
use std::time::Duration;

/// Errors that can signal a provider-side rate limit
pub trait RateLimited {
    fn is_rate_limited(&self) -> bool;
}

/// Bounded exponential backoff for third-party API calls.
///
/// Only rate-limit failures are retried; callers are responsible for making
/// sure the wrapped operation is safe to repeat.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on every subsequent retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the attempt with the given (zero-based) index failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Invoke `f` until it succeeds, fails with something other than a rate
    /// limit, or `max_attempts` calls have been made.
    pub async fn call<F, Fut, T, E>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimited + std::fmt::Display,
    {
        let mut attempt: u32 = 0;
        loop {
            let error = match f().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_rate_limited() {
                return Err(error);
            }
            if attempt + 1 >= self.max_attempts {
                tracing::warn!(
                    operation,
                    attempts = attempt + 1,
                    error = %error,
                    "Rate limited, giving up"
                );
                return Err(error);
            }

            let delay = self.delay_for(attempt);
            tracing::debug!(
                operation,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Rate limited, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
