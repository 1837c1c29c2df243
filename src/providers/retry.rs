//! Retry policy and the shared retry loop.
//!
//! Backoff is linear and deterministic: the delay after attempt `n`
//! (1-based) is `backoff × n`, with no jitter and no cap. There is no
//! deadline spanning all attempts; each attempt is bounded only by the
//! HTTP client timeout.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::{DetectorError, Result};

/// Configuration for retrying transient upstream errors.
///
/// ```rust
/// # use detector_gateway::providers::retry::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_attempts(4)
///     .backoff(Duration::from_millis(250));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. Default: 3.
    pub max_attempts: u32,
    /// Delay step multiplied by the attempt number. Default: 500ms.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Default policy: 3 attempts, 500ms step.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the maximum number of attempts, including the first.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the delay step multiplied by the attempt number.
    pub fn backoff(mut self, step: Duration) -> Self {
        self.backoff = step;
        self
    }

    /// Delay to wait after the given 1-based attempt failed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Run `f` until it succeeds, fails permanently, or attempts run out.
///
/// `f` receives the 1-based attempt number. Transient errors (as
/// classified by [`DetectorError::is_transient()`]) are retried after
/// [`RetryPolicy::delay_for_attempt()`]; once attempts are exhausted the
/// last one is returned wrapped in [`DetectorError::UpstreamFailure`].
/// Any other error is returned unchanged, immediately.
pub(crate) async fn with_retry<F, Fut, T>(policy: &RetryPolicy, provider: &str, f: F) -> Result<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 1..=policy.max_attempts {
        match f(attempt).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt < policy.max_attempts {
                    let delay = policy.delay_for_attempt(attempt);
                    metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider.to_owned())
                        .increment(1);
                    warn!(
                        provider,
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    match last_err {
        Some(source) => Err(DetectorError::UpstreamFailure {
            provider: provider.to_owned(),
            attempts: policy.max_attempts,
            source: Box::new(source),
        }),
        None => Err(DetectorError::Configuration(
            "max_retries must be at least 1".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn delay_is_linear_in_attempt() {
        let policy = RetryPolicy::new().backoff(Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(1500));
    }

    #[test]
    fn zero_backoff_never_waits() {
        let policy = RetryPolicy::new().backoff(Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(7), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_attempts_but_not_after_the_last() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new()
            .max_attempts(3)
            .backoff(Duration::from_secs(2));

        let start = Instant::now();
        let result: Result<()> = with_retry(&policy, "test", move |_| async move {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(DetectorError::Timeout)
        })
        .await;

        // 2s after attempt 1, 4s after attempt 2, nothing after attempt 3.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "{elapsed:?}");
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        match result {
            Err(DetectorError::UpstreamFailure {
                attempts, source, ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, DetectorError::Timeout));
            }
            other => panic!("expected UpstreamFailure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn passes_attempt_numbers() {
        let policy = RetryPolicy::new().max_attempts(3).backoff(Duration::ZERO);
        let result = with_retry(&policy, "test", |attempt| async move {
            if attempt < 3 {
                Err(DetectorError::UpstreamStatus { status: 503 })
            } else {
                Ok(attempt)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new().max_attempts(5).backoff(Duration::ZERO);
        let result: Result<()> = with_retry(&policy, "test", move |_| async move {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(DetectorError::Network("refused".into()))
        })
        .await;
        assert!(matches!(result, Err(DetectorError::Network(_))));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn disabled_policy_makes_one_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::disabled(), "test", move |_| async move {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(DetectorError::RateLimited { retry_after: None })
        })
        .await;
        assert!(matches!(
            result,
            Err(DetectorError::UpstreamFailure { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
