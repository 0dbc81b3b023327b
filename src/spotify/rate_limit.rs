use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// How the executor reacts to `429 Too Many Requests`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first call; the call runs at most `max_retries + 1` times.
    pub max_retries: u32,
    /// Backoff base when the response carries no usable `retry-after` hint.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    ///
    /// A positive `retry-after` value is honoured as seconds; otherwise the
    /// delay doubles with every attempt starting from `base_delay`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        match retry_after {
            Some(seconds) if seconds > 0 => Duration::from_millis(seconds.saturating_mul(1000)),
            _ => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        }
    }
}

/// Runs `call` until it succeeds, fails with something other than a 429, or
/// the retry budget is spent.
///
/// Only `Error::Upstream` with status 429 is retried. When the call is still
/// rate limited after `policy.max_retries` retries the last response is
/// returned inside `Error::RateLimitExhausted`.
///
/// # Example
///
/// ```
/// let policy = RetryPolicy::default();
/// let track = execute(&policy, "get track", || api.track(token, id)).await?;
/// ```
pub async fn execute<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(Error::Upstream { response }) if response.status == 429 => {
                if attempt >= policy.max_retries {
                    warn!(
                        operation,
                        attempts = attempt + 1,
                        "rate limit not lifted, giving up"
                    );
                    return Err(Error::RateLimitExhausted {
                        attempts: attempt + 1,
                        response,
                    });
                }

                let delay = policy.delay_for(attempt, response.retry_after);
                debug!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
