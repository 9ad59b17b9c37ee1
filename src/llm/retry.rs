//! Bounded retry with exponential backoff.
//!
//! [`RetryPolicy::backoff_delay`] is a pure function of the number of failed
//! attempts so far; [`RetryPolicy::run`] drives an async operation through
//! the schedule.  Non-retryable errors (see [`LlmError::is_retryable`]) stop
//! the loop immediately.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::GenerationConfig;
use crate::llm::LlmError;

/// Why a retried operation gave up.
#[derive(Debug, Clone, Error)]
pub enum RetryError {
    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: LlmError },

    /// An attempt failed with an error that retrying cannot fix.
    #[error("aborted: {0}")]
    Aborted(LlmError),
}

/// Attempt budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Delay to wait after `failed` attempts have failed.
    ///
    /// ```
    /// use std::time::Duration;
    /// use eigo_drill::llm::RetryPolicy;
    ///
    /// let p = RetryPolicy::new(3, Duration::from_millis(5_000));
    /// assert_eq!(p.backoff_delay(0), Duration::ZERO);
    /// assert_eq!(p.backoff_delay(1), Duration::from_millis(5_000));
    /// assert_eq!(p.backoff_delay(2), Duration::from_millis(10_000));
    /// ```
    pub fn backoff_delay(&self, failed: u32) -> Duration {
        if failed == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(failed - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, the budget is spent, or it fails with a
    /// non-retryable error.  `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut failed = 0u32;
        loop {
            let delay = self.backoff_delay(failed);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let attempt = failed + 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(RetryError::Aborted(err)),
                Err(err) => {
                    failed += 1;
                    log::warn!("attempt {attempt}/{} failed: {err}", self.max_attempts);
                    if failed >= self.max_attempts {
                        return Err(RetryError::Exhausted {
                            attempts: failed,
                            last: err,
                        });
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn backoff_doubles_from_base() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff_delay(0), Duration::ZERO);
        assert_eq!(p.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(p.backoff_delay(2), Duration::from_secs(10));
        assert_eq!(p.backoff_delay(3), Duration::from_secs(20));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let p = RetryPolicy::new(3, Duration::from_secs(1));
        assert!(p.backoff_delay(64) >= p.backoff_delay(31));
    }

    #[test]
    fn zero_attempt_budget_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let out = instant_policy(3)
            .run(move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, LlmError>("ok")
            })
            .await
            .unwrap();
        assert_eq!(out, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let out = instant_policy(3)
            .run(|attempt| async move {
                if attempt < 3 {
                    Err(LlmError::Timeout)
                } else {
                    Ok(attempt)
                }
            })
            .await
            .unwrap();
        assert_eq!(out, 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = instant_policy(3)
            .run(move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LlmError::Malformed("no prefix".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn non_retryable_error_aborts_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = instant_policy(3)
            .run(move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LlmError::NotConfigured("no key".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, RetryError::Aborted(LlmError::NotConfigured(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_backoff_schedule_between_attempts() {
        let start = tokio::time::Instant::now();
        let _ = RetryPolicy::default()
            .run(|_| async { Err::<(), _>(LlmError::Timeout) })
            .await;
        // 5 s before attempt 2, 10 s before attempt 3.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(15), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(16), "elapsed {elapsed:?}");
    }
}
