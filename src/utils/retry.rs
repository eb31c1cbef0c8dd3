//! Retry with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Invoke `op` up to `max_retries + 1` times, waiting
/// `initial_delay * multiplier^attempt` between failures (attempt 0-indexed at
/// the first retry). Returns the first success, or the last error once
/// attempts are exhausted.
///
/// External services fail transiently (rate limits, availability blips), so
/// retries are spaced out rather than issued back to back. The wait is a
/// cooperative `tokio::time::sleep` and never blocks sibling operations.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_retries: u32,
    initial_delay: Duration,
    multiplier: f64,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    for attempt in 0..max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    "Attempt {}/{} failed ({}), retrying in {:.1}s",
                    attempt + 1,
                    max_retries + 1,
                    err,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(multiplier);
            }
        }
    }
    op().await
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let calls = Cell::new(0u32);
        let result: Result<i32, String> =
            retry_with_backoff(3, Duration::from_secs(1), 2.0, || {
                calls.set(calls.get() + 1);
                async { Ok(42) }
            })
            .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_propagates_last_error() {
        let calls = Cell::new(0u32);
        let start = tokio::time::Instant::now();
        let result: Result<i32, String> =
            retry_with_backoff(3, Duration::from_secs(1), 2.0, || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Err(format!("boom {n}")) }
            })
            .await;
        // max_retries = 3 means 4 invocations total, and the final error wins.
        assert_eq!(result, Err("boom 4".to_string()));
        assert_eq!(calls.get(), 4);
        // Waits of 1s, 2s, 4s between the four attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_circuits_after_recovery() {
        let calls = Cell::new(0u32);
        let result: Result<&str, String> =
            retry_with_backoff(5, Duration::from_millis(100), 2.0, || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err("not yet".to_string())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        // Failed twice then succeeded: exactly k+1 = 3 invocations.
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let calls = Cell::new(0u32);
        let result: Result<i32, String> =
            retry_with_backoff(0, Duration::from_secs(10), 2.0, || {
                calls.set(calls.get() + 1);
                async { Err("no".to_string()) }
            })
            .await;
        assert_eq!(result, Err("no".to_string()));
        assert_eq!(calls.get(), 1);
    }
}
