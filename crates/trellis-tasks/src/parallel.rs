//! Fail-together parallel fan-out.
//!
//! Every task runs to completion before any error is reported, so partial
//! side effects are never hidden behind an early return. The reported error
//! is the first failure in input order, not completion order.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Run all `tasks` concurrently and collect their outputs in input order.
///
/// All tasks are driven to completion even when some fail; the first error
/// in input order is then returned.
pub async fn run_parallel<I, F, T, E>(tasks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    join_all(tasks).await.into_iter().collect()
}

/// Like [`run_parallel`], but at most `limit` tasks run at once.
///
/// Tasks acquire permits in input order. A `limit` of zero is treated as
/// one.
pub async fn run_parallel_with_limit<I, F, T, E>(limit: usize, tasks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let guarded = tasks.into_iter().map(|task| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            // The semaphore is owned here and never closed; acquire only
            // fails on close, so a miss just runs the task unguarded.
            let _permit = semaphore.acquire().await.ok();
            task.await
        }
    });
    join_all(guarded).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn outputs_keep_input_order() {
        let tasks = (0..5).map(|i| async move {
            // Later tasks finish first.
            tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
            Ok::<u64, String>(i)
        });
        let results = run_parallel(tasks).await.unwrap();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn all_tasks_settle_before_error_is_reported() {
        let completed = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let completed = Arc::clone(&completed);
                async move {
                    tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    if i == 1 { Err(format!("task {i} failed")) } else { Ok(i) }
                }
            })
            .collect();

        let result = run_parallel(tasks).await;
        assert_eq!(result, Err("task 1 failed".to_owned()));
        assert_eq!(completed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn first_error_in_input_order_wins() {
        let tasks = vec![
            async { Ok::<(), &str>(()) }.boxed(),
            // Fails late but sits earlier in input order.
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Err("early slot")
            }
            .boxed(),
            async { Err("late slot") }.boxed(),
        ];
        assert_eq!(run_parallel(tasks).await, Err("early slot"));
    }

    #[tokio::test(start_paused = true)]
    async fn limit_caps_concurrency() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(Mutex::new(0usize));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    {
                        let mut peak = peak.lock().unwrap();
                        *peak = (*peak).max(now);
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<usize, String>(i)
                }
            })
            .collect();

        let results = run_parallel_with_limit(3, tasks).await.unwrap();
        assert_eq!(results.len(), 8);
        assert!(*peak.lock().unwrap() <= 3);
    }

    #[tokio::test]
    async fn zero_limit_still_makes_progress() {
        let tasks = (0..3).map(|i| async move { Ok::<u32, String>(i) });
        let results = run_parallel_with_limit(0, tasks).await.unwrap();
        assert_eq!(results, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let tasks: Vec<std::future::Ready<Result<u32, String>>> = vec![];
        assert_eq!(run_parallel(tasks).await.unwrap(), Vec::<u32>::new());
    }
}
