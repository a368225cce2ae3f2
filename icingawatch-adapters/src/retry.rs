//! Bounded retry with a fixed delay.
//!
//! Only [`AdapterError::Connection`] is retried. Everything else, including
//! malformed responses, is returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::AdapterError;

/// Retry ceiling used by the Icinga client unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 30;

/// Delay between attempts used unless configured otherwise.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How often and how long to wait before giving up on an unreachable server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Fixed sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry ceiling is hit.
    ///
    /// Exhausting the retries yields [`AdapterError::Unavailable`].
    pub async fn run<T, F, Fut>(&self, target: &str, mut op: F) -> Result<T, AdapterError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AdapterError>>,
    {
        let mut retried = 0;

        loop {
            match op().await {
                Err(err) if err.is_retryable() => {
                    if retried >= self.max_retries {
                        warn!(
                            "Maximum retries ({}) against '{}' reached. Giving up",
                            self.max_retries, target
                        );
                        return Err(AdapterError::Unavailable {
                            target: target.to_string(),
                            attempts: retried + 1,
                        });
                    }

                    retried += 1;
                    warn!(
                        "Cannot execute request against '{}': {} (retry {} / {})",
                        target, err, retried, self.max_retries
                    );
                    tokio::time::sleep(self.delay).await;
                }
                other => return other,
            }
        }
    }
}
