//! Retry with exponential backoff for provider requests

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;

/// Longest delay between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Backoff before retry number `attempt` (0-based): 1s, 2s, 4s, ... capped at 30s
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.min(5))).min(MAX_BACKOFF)
}

/// Run `operation` up to `max_retries + 1` times, sleeping between failures
///
/// With `max_retries == 0` the first error is returned as-is.
pub async fn retry_request<F, Fut, T>(label: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries => {
                let delay = backoff(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label,
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
