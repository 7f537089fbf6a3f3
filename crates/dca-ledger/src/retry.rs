//! Retry with exponential backoff for idempotent gateway reads.
//!
//! Only transport failures (connection refused, timeouts) are retried.
//! Stake submissions never go through this path: a retried POST could
//! submit the same transfer twice.

use std::future::Future;
use std::time::Duration;

/// Backoff schedule: `base`, `2 × base`, `4 × base`, … for `max_retries`
/// retries after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for Backoff {
    /// Three retries: 200ms, 400ms, 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl Backoff {
    /// No retries at all.
    pub const NONE: Backoff = Backoff {
        max_retries: 0,
        base_delay: Duration::ZERO,
    };

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `send` until it returns a response or the retries run out.
    /// HTTP status codes are left to the caller.
    pub(crate) async fn send<F, Fut>(&self, operation: &str, send: F) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            match send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        "ledger gateway request failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
