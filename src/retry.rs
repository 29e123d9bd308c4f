use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Delay before the retry that follows a failed `attempt` (1-indexed).
///
/// - Attempt 1: `base`
/// - Attempt 2: `base * 2`
/// - Attempt n: `base * 2^(n-1)`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent)
}

/// Run `operation` up to `max_attempts` times with exponential backoff.
///
/// Returns the first success. If every attempt fails the last error is
/// returned unchanged. A `max_attempts` of 0 still runs once.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                let delay = backoff_delay(base_delay, attempt);
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
