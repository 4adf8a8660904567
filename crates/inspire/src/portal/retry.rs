//! Rate limiting and retry policy for portal requests.

use super::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Enforces a minimum gap between two outbound requests.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Waits until `delay` has passed since the previous request, then marks
    /// a new request as started.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            if ready_at > Instant::now() {
                debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Rate limiting portal request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Retries transient failures a fixed number of times with a constant delay
/// between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` extra attempts, waiting `delay`
    /// before each of them.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Runs `op` until it succeeds, fails permanently, or has been attempted
    /// `max_retries + 1` times. The last error is returned on exhaustion.
    ///
    /// # Arguments
    /// * `what` - Short description of the request, for logging
    /// * `op` - Produces a fresh request future per attempt
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(request = what, attempt, "Portal request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    warn!(
                        request = what,
                        attempt,
                        max_attempts = self.max_retries + 1,
                        error = %e,
                        "Transient portal failure, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    warn!(request = what, attempt, error = %e, "Portal request failed");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_transient_failure_exhausts_all_attempts() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .run("always down", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Status { code: 503 })
                }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status { code: 503 })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .run("bad request", || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Status { code: 400 })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .run("flaky", || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(FetchError::Timeout {
                            message: "slow".to_string(),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_wait_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(20));
        let start = Instant::now();

        let result: Result<(), _> = policy
            .run("reset", || async {
                Err(FetchError::Network {
                    message: "connection reset".to_string(),
                })
            })
            .await;

        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
