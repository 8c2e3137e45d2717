//! Bounded retry with exponential backoff for transient service failures.

use crate::utils::error::ServiceError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based), doubling each time.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is reached.
///
/// Only [`ServiceError::Retryable`] is retried. Exhausting the attempts yields
/// [`ServiceError::RetriesExhausted`] so callers can treat it as terminal.
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Service call succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() => {
                if attempt >= max_attempts {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        "Giving up after transient failures: {}",
                        err
                    );
                    return Err(ServiceError::RetriesExhausted {
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }

                let delay = policy.delay_after(attempt);
                tracing::info!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying: {}",
                    err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
