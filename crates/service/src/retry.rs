use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use configs::RetryConfig;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::observability::UPSTREAM_RETRIES_TOTAL;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    enabled: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration, enabled: bool) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_base, backoff_max, enabled }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(cfg.max_attempts, cfg.backoff_base(), cfg.backoff_max(), cfg.enabled)
    }

    /// Single attempt, no waiting.
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, false)
    }

    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts
        } else {
            1
        }
    }

    /// Exponential backoff: base * 2^(attempt-1), capped at `backoff_max`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        if !self.enabled || attempt == 0 {
            return;
        }
        let backoff = self.backoff_for(attempt);
        debug!(?backoff, attempt, "retrying upstream call");
        sleep(backoff).await;
    }

    /// `attempts_made` counts the attempts already finished.
    pub fn should_retry<E: Retryable>(&self, attempts_made: u32, error: &E) -> bool {
        self.enabled && attempts_made < self.max_attempts() && error.is_retryable()
    }
}

pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempts_made = 0;
    loop {
        if attempts_made > 0 {
            UPSTREAM_RETRIES_TOTAL.inc();
            policy.wait_before_retry(attempts_made).await;
        }

        match operation().await {
            Ok(result) => {
                if attempts_made > 0 {
                    debug!(retries = attempts_made, "upstream call succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                attempts_made += 1;
                if policy.should_retry(attempts_made, &error) {
                    warn!(attempt = attempts_made, %error, "upstream call failed, will retry");
                    continue;
                }
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (retryable: {})", self.retryable)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn policy(max_attempts: u32, enabled: bool) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(10), enabled)
    }

    #[tokio::test]
    async fn success_first_try() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_policy(&policy(3, true), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<i32, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_after_transient_failure() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_policy(&policy(2, true), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError { retryable: true })
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some(7));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_at_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_policy(&policy(2, true), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError { retryable: true })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_error_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_policy(&policy(3, true), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError { retryable: false })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_policy_makes_one_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_policy(&policy(3, false), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError { retryable: true })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy::new(5, Duration::from_millis(200), Duration::from_millis(500), true);
        assert_eq!(p.backoff_for(0), Duration::ZERO);
        assert_eq!(p.backoff_for(1), Duration::from_millis(200));
        assert_eq!(p.backoff_for(2), Duration::from_millis(400));
        assert_eq!(p.backoff_for(3), Duration::from_millis(500));
        assert_eq!(p.backoff_for(40), Duration::from_millis(500));
    }
}
