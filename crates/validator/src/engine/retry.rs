//! Retry with a per-attempt time limit
//!
//! Used for async predicates. Each attempt is wrapped in
//! [`tokio::time::timeout`]; a timed-out attempt is dropped, which cancels
//! the underlying call.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::strategy::RetryConfig;

/// Retry and timeout settings for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry: Option<RetryConfig>,
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(retry: Option<RetryConfig>, timeout: Option<Duration>) -> Self {
        Self { retry, timeout }
    }

    fn max_retries(&self) -> u32 {
        self.retry.map_or(0, |r| r.max_retries)
    }
}

/// Why the last attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E> {
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),

    #[error("attempt failed: {0}")]
    Failed(E),
}

/// Final answer plus the number of retries it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, RetryError<E>>,
    pub retries: u32,
}

/// Calls `operation` until it succeeds or the policy runs out of retries.
///
/// `operation` receives the 0-based retry number.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_retries = policy.max_retries();
    let mut retries = 0;

    loop {
        let attempt = operation(retries);
        let result = match policy.timeout {
            Some(limit) => match timeout(limit, attempt).await {
                Ok(answer) => answer.map_err(RetryError::Failed),
                Err(_) => Err(RetryError::TimedOut(limit)),
            },
            None => attempt.await.map_err(RetryError::Failed),
        };

        match (result, policy.retry) {
            (Ok(value), _) => {
                return RetryOutcome {
                    result: Ok(value),
                    retries,
                };
            }
            (Err(_), Some(config)) if retries < max_retries => {
                let delay = config.delay_for(retries);
                tracing::debug!(retry = retries + 1, ?delay, "attempt failed, retrying");
                sleep(delay).await;
                retries += 1;
            }
            (Err(error), _) => {
                return RetryOutcome {
                    result: Err(error),
                    retries,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(Some(RetryConfig::fixed(3, Duration::from_millis(100))), None);

        let outcome = retry(&policy, |_| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("flaky")
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(outcome.result, Ok(7));
        assert_eq!(outcome.retries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let policy = RetryPolicy::new(Some(RetryConfig::exponential(2, Duration::from_millis(10))), None);
        let outcome: RetryOutcome<(), _> = retry(&policy, |_| async { Err("down") }).await;

        assert_eq!(outcome.result, Err(RetryError::Failed("down")));
        assert_eq!(outcome.retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempt_times_out() {
        let policy = RetryPolicy::new(None, Some(Duration::from_millis(50)));
        let outcome: RetryOutcome<bool, &str> = retry(&policy, |_| async {
            sleep(Duration::from_secs(5)).await;
            Ok(true)
        })
        .await;

        assert_eq!(outcome.result, Err(RetryError::TimedOut(Duration::from_millis(50))));
        assert_eq!(outcome.retries, 0);
    }

    #[tokio::test]
    async fn no_policy_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<(), &str> = retry(&RetryPolicy::default(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("nope") }
        })
        .await;

        assert!(outcome.result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
