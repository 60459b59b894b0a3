//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

/// Backoff schedule for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failure.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` and the default delay schedule.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }
}

/// Run `operation` until it succeeds or the attempt budget is spent.
///
/// The operation receives the 1-based attempt number. After each failure
/// that leaves budget, `on_retry` is invoked with the attempt number and
/// the error, then the loop sleeps for the current delay and multiplies it
/// by the backoff factor. The final failure is returned without sleeping
/// and without notifying.
pub async fn retry_with_backoff<F, Fut, T, E, N>(
    policy: RetryPolicy,
    mut operation: F,
    mut on_retry: N,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    N: FnMut(u32, &E),
{
    let budget = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= budget => {
                tracing::warn!(%error, attempt, "giving up");
                return Err(error);
            },
            Err(error) => {
                tracing::debug!(
                    %error,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, backing off"
                );
                on_retry(attempt, &error);
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(policy.backoff_factor);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test]
    async fn immediate_success_makes_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = retry_with_backoff(
            RetryPolicy::default(),
            |_| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("done")
                }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_back_off_exponentially() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
        };
        let start = Instant::now();

        let result = retry_with_backoff(
            policy,
            |attempt| async move {
                if attempt < 3 { Err(format!("attempt {attempt}")) } else { Ok(attempt) }
            },
            |_, _| {},
        )
        .await;

        assert_eq!(result, Ok(3));
        // 100ms after the first failure, 200ms after the second.
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn final_failure_returns_last_error_without_sleeping() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(50),
            backoff_factor: 2.0,
        };
        let start = Instant::now();

        let result: Result<(), String> = retry_with_backoff(
            policy,
            |attempt| async move { Err(format!("attempt {attempt}")) },
            |_, _| {},
        )
        .await;

        assert_eq!(result, Err("attempt 2".to_owned()));
        // One backoff sleep between the two attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn zero_attempt_budget_still_runs_once() {
        let result: Result<(), &str> =
            retry_with_backoff(RetryPolicy::with_attempts(0), |_| async { Err("nope") }, |_, _| {})
                .await;
        assert_eq!(result, Err("nope"));
    }

    #[tokio::test(start_paused = true)]
    async fn on_retry_fires_once_per_failure_that_retries() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            backoff_factor: 2.0,
        };
        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notified);

        // Fails twice, succeeds on the third attempt.
        let result = retry_with_backoff(
            policy,
            |attempt| async move {
                if attempt < 3 { Err(format!("boom {attempt}")) } else { Ok(attempt) }
            },
            move |attempt, error: &String| {
                if let Ok(mut notified) = sink.lock() {
                    notified.push((attempt, error.clone()));
                }
            },
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(
            notified.lock().unwrap().clone(),
            vec![(1, "boom 1".to_owned()), (2, "boom 2".to_owned())]
        );
    }
}
