//! Bounded-concurrency execution of async operations over a batch.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `op` over `items` with at most `max_concurrency` operations in flight.
///
/// Returns one outcome per item, positionally aligned with the input:
/// `outcomes[i]` is always item `i`'s result, regardless of completion order.
/// A failing item never cancels or delays its siblings beyond the admission
/// limit. An empty input yields an empty output without invoking `op`.
///
/// All futures are polled within the calling task, so "concurrency" here is
/// concurrency of outstanding I/O, not parallel computation. There is no
/// per-item deadline: a hung operation occupies its slot until it resolves.
/// Call sites that need a timeout wrap `op` with `tokio::time::timeout`.
pub async fn parallel_process<T, R, E, F, Fut>(
    items: impl IntoIterator<Item = T>,
    max_concurrency: usize,
    op: F,
) -> Vec<Result<R, E>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let limit = max_concurrency.max(1);
    stream::iter(items.into_iter().map(op))
        .buffered(limit)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    async fn square(n: u32) -> Result<u32, String> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(n * n)
    }

    async fn square_or_fail(n: u32) -> Result<u32, String> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if n % 2 == 0 {
            Ok(n * n)
        } else {
            Err(format!("Failed for odd number {n}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved() {
        // Later items finish first; outcomes must still line up with inputs.
        let delays = [50u64, 40, 30, 20, 10];
        let results = parallel_process(0..5usize, 5, |i| async move {
            tokio::time::sleep(Duration::from_millis(delays[i])).await;
            Ok::<_, String>(i)
        })
        .await;
        let values: Vec<usize> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_isolated() {
        let results = parallel_process(0..5u32, 3, square_or_fail).await;
        assert_eq!(results.len(), 5);
        assert_eq!(results[0], Ok(0));
        assert_eq!(results[2], Ok(4));
        assert_eq!(results[4], Ok(16));
        assert_eq!(results[1], Err("Failed for odd number 1".to_string()));
        assert_eq!(results[3], Err("Failed for odd number 3".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_fail() {
        let results = parallel_process(0..3u32, 2, |n| async move {
            Err::<u32, _>(format!("Failed for {n}"))
        })
        .await;
        let messages: Vec<String> = results.into_iter().map(|r| r.unwrap_err()).collect();
        assert_eq!(messages, vec!["Failed for 0", "Failed for 1", "Failed for 2"]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let calls = AtomicUsize::new(0);
        let results: Vec<Result<u32, String>> =
            parallel_process(Vec::<u32>::new(), 5, |n| {
                calls.fetch_add(1, Ordering::SeqCst);
                square(n)
            })
            .await;
        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let results = parallel_process(0..10u32, 3, |n| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(n)
            }
        })
        .await;

        assert_eq!(results.len(), 10);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_time_scales_with_limit() {
        // 10 identical 100ms operations: ceil(10/C) * 100ms with a paused,
        // auto-advancing clock.
        let delay = Duration::from_millis(100);
        let timed = |limit: usize| async move {
            let start = tokio::time::Instant::now();
            let results = parallel_process(0..10u32, limit, |n| async move {
                tokio::time::sleep(delay).await;
                Ok::<_, String>(n * n)
            })
            .await;
            assert!(results.iter().all(|r| r.is_ok()));
            start.elapsed()
        };

        let sequential = timed(1).await;
        let low = timed(2).await;
        let high = timed(5).await;

        assert_eq!(sequential, Duration::from_millis(1000));
        assert_eq!(low, Duration::from_millis(500));
        assert_eq!(high, Duration::from_millis(200));
    }
}
