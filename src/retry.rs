use crate::clock::Clock;
use crate::config::ReliabilityConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const MIN_BACKOFF_MS: u64 = 50;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ReliabilityConfig) -> Self {
        let initial_ms = config.backoff_ms.max(MIN_BACKOFF_MS);
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(initial_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms.max(initial_ms)),
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `op` until it succeeds or `policy.max_retries` retries are spent.
///
/// Returns the last error once the budget is exhausted.
pub async fn with_backoff<T, E, F, Fut>(
    clock: &dyn Clock,
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                let delay = policy.backoff_for(attempt);
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "{what} failed, retrying: {e}"
                );
                clock.sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
