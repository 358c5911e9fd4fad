use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tracing::warn;

use crate::BackoffPolicy;
use crate::StoreError;

/// Run `task` until it succeeds, with per-attempt timeout and capped
/// exponential backoff between attempts. Returns the last error once
/// `policy.max_retries` attempts are spent.
pub(crate) async fn retry_with_backoff<F, Fut, T>(
    task: F,
    policy: BackoffPolicy,
) -> std::result::Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, StoreError>>,
{
    let timeout_duration = Duration::from_millis(policy.timeout_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let mut delay = Duration::from_millis(policy.base_delay_ms);
    let mut attempts = 0;
    let mut last_error = StoreError::RetryExhausted(policy.max_retries);

    while attempts < policy.max_retries {
        match timeout(timeout_duration, task()).await {
            Ok(Ok(result)) => return Ok(result),
            Ok(Err(error)) => {
                warn!("attempt {} failed: {}", attempts + 1, &error);
                last_error = error;
            }
            Err(_) => {
                warn!("attempt {} timed out after {:?}", attempts + 1, timeout_duration);
                last_error = StoreError::Timeout(timeout_duration);
            }
        }

        attempts += 1;
        if attempts < policy.max_retries {
            sleep(delay).await;
            delay = (delay * 2).min(max_delay);
        }
    }
    Err(last_error)
}
