//! Bounded retry and per-attempt timeout for source calls
//!
//! **Algorithm:**
//! 1. Run the operation, raced against `attempt_timeout`
//! 2. On success, return the result
//! 3. On a non-retryable error, return it unchanged
//! 4. On a retryable error with attempts left, sleep `n × base_delay`
//!    (n = the attempt that just failed) and go to 1
//! 5. On a retryable error with no attempts left, wrap it in
//!    [`SourceError::Exhausted`]

use std::future::Future;
use std::time::Duration;
use xtrend_common::config::RetryConfig;

use super::SourceError;

/// Retry bounds for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
        }
    }

    /// Sleep before the attempt following `failed_attempt`
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay * failed_attempt
    }
}

/// Race `operation` against `timeout`
///
/// Exceeding the timeout fails with [`SourceError::Timeout`]; the inner
/// future is dropped.
pub async fn with_timeout<Fut, T>(timeout: Duration, operation: Fut) -> Result<T, SourceError>
where
    Fut: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

/// Run `operation` under `policy`
///
/// # Arguments
/// * `context` - Operation name for logs and the exhaustion error (e.g. "XApiSource.get_trends")
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    context: &str,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = context, attempt, "Retrying source operation");
        }

        let err = match with_timeout(policy.attempt_timeout, operation()).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = context,
                        attempt,
                        "Source operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        if attempt >= max_attempts {
            tracing::error!(
                operation = context,
                attempt,
                error = %err,
                "Source operation failed: retries exhausted"
            );
            return Err(SourceError::Exhausted {
                context: context.to_string(),
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(
            operation = context,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Source operation failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
