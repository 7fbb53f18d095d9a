// =============================================================================
// Retry with exponential backoff
// =============================================================================
//
// Wraps a failable async operation. Attempt `n` (0-based) that fails is
// followed by a sleep of `initial_delay * 2^n`, except after the last attempt.
// The error of the last attempt is returned unchanged once all attempts are
// used up.
// =============================================================================

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

/// Attempt budget and base delay for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts. Zero is treated as one.
    pub retries: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_delay: Duration) -> Self {
        Self {
            retries,
            initial_delay,
        }
    }

    /// Delay that follows failed attempt number `attempt` (0-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Run `op` until it succeeds or the policy's attempts are exhausted.
///
/// `label` only identifies the operation in log output.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.retries.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 >= attempts {
                    error!(operation = label, attempts, error = %e, "all retry attempts failed");
                    return Err(e);
                }

                let delay = policy.delay_after(attempt);
                warn!(
                    operation = label,
                    attempt = attempt + 1,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Operation that fails `failures` times with a numbered error, then
    /// yields "ok".
    fn flaky(
        calls: &AtomicU32,
        failures: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str, String>> + '_ {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                std::future::ready(Err(format!("failure {}", n + 1)))
            } else {
                std::future::ready(Ok("ok"))
            }
        }
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(0), Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    }

    #[test]
    fn delay_saturates_on_huge_attempts() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_after(64), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures_with_backoff() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = with_retry(&RetryPolicy::default(), "test", flaky(&calls, 2)).await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_short_circuits() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = with_retry(&RetryPolicy::default(), "test", flaky(&calls, 0)).await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_returns_last_error() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = with_retry(&RetryPolicy::default(), "test", flaky(&calls, u32::MAX)).await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500 + 1000, no sleep after the final attempt.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed < Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_millis(10));

        let result = with_retry(&policy, "test", flaky(&calls, u32::MAX)).await;

        assert_eq!(result, Err("failure 1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
