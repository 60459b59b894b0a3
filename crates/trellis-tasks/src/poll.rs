//! Condition polling and timeout wrapping.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::TimeoutError;

/// Poll `condition` every `interval` until it returns true or `timeout`
/// elapses.
///
/// The condition is checked immediately, then on each interval tick; the
/// final check happens at the deadline rather than one interval past it.
/// Returns false on timeout.
pub async fn poll_until<F, Fut>(interval: Duration, timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(timeout_ms = timeout.as_millis() as u64, "poll timed out");
            return false;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

/// Run `future` with a time limit.
pub async fn run_with_timeout<F, T>(limit: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, future).await.map_err(|_| TimeoutError { limit })
}
