//! Timeout + retry wrapper around every remote operation.
//!
//! Each attempt runs on its own tokio task so the caller can stop waiting
//! once the deadline passes. Giving up on a task only drops its
//! `JoinHandle`: the request keeps running detached and may still reach
//! the service. A timed-out playlist write can therefore land twice.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::error::RemoteError;
use crate::catalog::CatalogError;

/// Counts successful remote calls for the lifetime of a run.
#[derive(Debug, Default)]
pub struct ApiCallCounter {
    count: AtomicU64,
}

impl ApiCallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Attempt budget and waits applied between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per logical call, every failure class included
    pub max_attempts: u32,
    /// Deadline for one attempt
    pub call_timeout: Duration,
    pub unavailable_delay: Duration,
    pub server_error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            call_timeout: Duration::from_secs(60),
            unavailable_delay: Duration::from_secs(5),
            server_error_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// How long to wait before the next attempt after `failure`.
    pub fn delay_for(&self, failure: &RemoteError) -> Duration {
        match failure {
            RemoteError::RateLimited { retry_after } => *retry_after,
            RemoteError::ServiceUnavailable(_) => self.unavailable_delay,
            RemoteError::ServerError { .. } => self.server_error_delay,
            _ => Duration::ZERO,
        }
    }
}

/// Runs remote operations under a [`RetryPolicy`] and counts the successes.
pub struct RemoteCallExecutor {
    policy: RetryPolicy,
    counter: ApiCallCounter,
}

impl Default for RemoteCallExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RemoteCallExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            counter: ApiCallCounter::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn counter(&self) -> &ApiCallCounter {
        &self.counter
    }

    /// Execute `op` until it succeeds or the attempt budget runs out.
    ///
    /// `op` builds a fresh future per attempt with its arguments already
    /// bound. `label` only shows up in logs.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
        T: Send + 'static,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match self.attempt(op()).await {
                Ok(value) => {
                    self.counter.record();
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if attempt >= max_attempts {
                log::error!(
                    "{} failed: {}. Max retries ({}) reached, giving up",
                    label,
                    failure,
                    max_attempts
                );
                return Err(RemoteError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(failure),
                });
            }

            let delay = self.policy.delay_for(&failure);
            if delay.is_zero() {
                log::warn!(
                    "{} failed: {}. Retrying... (attempt {}/{})",
                    label,
                    failure,
                    attempt + 1,
                    max_attempts
                );
            } else {
                log::warn!(
                    "{} failed: {}. Sleeping {}s before attempt {}/{}",
                    label,
                    failure,
                    delay.as_secs_f64(),
                    attempt + 1,
                    max_attempts
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// One attempt on a detached task, bounded by the call timeout.
    async fn attempt<T, Fut>(&self, fut: Fut) -> Result<T, RemoteError>
    where
        Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(fut);

        match tokio::time::timeout(self.policy.call_timeout, handle).await {
            Ok(Ok(result)) => result.map_err(RemoteError::from),
            Ok(Err(join_err)) => Err(RemoteError::Unexpected(format!(
                "remote task aborted: {}",
                join_err
            ))),
            // Dropping the handle detaches the task; any late result is discarded.
            Err(_) => Err(RemoteError::Timeout(self.policy.call_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;
    use tokio::time::Instant;

    type BoxedCall = Pin<Box<dyn Future<Output = Result<&'static str, CatalogError>> + Send>>;

    /// Fails with `failures` in order, then succeeds.
    fn scripted(failures: Vec<CatalogError>) -> (Arc<AtomicU32>, impl FnMut() -> BoxedCall) {
        let calls = Arc::new(AtomicU32::new(0));
        let failures = Arc::new(failures);
        let counter = calls.clone();
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
            let failures = failures.clone();
            Box::pin(async move {
                match failures.get(n) {
                    Some(err) => Err(err.clone()),
                    None => Ok("done"),
                }
            }) as BoxedCall
        };
        (calls, op)
    }

    #[tokio::test]
    async fn test_success_counts_once() {
        let executor = RemoteCallExecutor::default();
        let (calls, op) = scripted(vec![]);

        let value = executor.execute("ok", op).await.unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(executor.counter().get(), 1);
    }

    #[tokio::test]
    async fn test_generic_failures_exhaust_retries() {
        let executor = RemoteCallExecutor::default();
        let failures = (0..5).map(|i| CatalogError::Network(format!("boom {}", i))).collect();
        let (calls, op) = scripted(failures);

        let err = executor.execute("flaky", op).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(executor.counter().get(), 0);
        match err {
            RemoteError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 5);
                assert!(matches!(*last, RemoteError::Unexpected(ref msg) if msg.contains("boom 4")));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_client_errors() {
        let executor = RemoteCallExecutor::default();
        let failures = vec![CatalogError::status(404, "nope"), CatalogError::status(400, "bad")];
        let (calls, op) = scripted(failures);

        let value = executor.execute("client", op).await.unwrap();

        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(executor.counter().get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_sleeps_for_retry_after() {
        let executor = RemoteCallExecutor::default();
        let failures = vec![CatalogError::rate_limited(Some(Duration::from_secs(2)))];
        let (calls, op) = scripted(failures);

        let start = Instant::now();
        executor.execute("limited", op).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_hint_waits_one_second() {
        let executor = RemoteCallExecutor::default();
        let (_, op) = scripted(vec![CatalogError::rate_limited(None)]);

        let start = Instant::now();
        executor.execute("limited", op).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_backoff() {
        let executor = RemoteCallExecutor::default();
        let failures = vec![CatalogError::status(503, "down"), CatalogError::status(500, "oops")];
        let (calls, op) = scripted(failures);

        let start = Instant::now();
        executor.execute("server", op).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(5 + 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_share_attempt_budget() {
        let executor = RemoteCallExecutor::default();
        let failures = (0..5)
            .map(|_| CatalogError::rate_limited(Some(Duration::from_secs(3))))
            .collect();
        let (calls, op) = scripted(failures);

        let start = Instant::now();
        let err = executor.execute("limited", op).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // No wait after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(4 * 3));
        assert!(matches!(err.root_cause(), RemoteError::RateLimited { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_abandons_stalled_call() {
        let executor = RemoteCallExecutor::new(RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        });
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let start = Instant::now();
        let value = executor
            .execute("stall", move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                    Ok::<_, CatalogError>(n)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(executor.counter().get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_exhaust_retries() {
        let executor = RemoteCallExecutor::default();

        let err = executor
            .execute("stall", || async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<_, CatalogError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RemoteError::RetriesExhausted { attempts: 5, ref last } if matches!(**last, RemoteError::Timeout(_))
        ));
        assert_eq!(executor.counter().get(), 0);
    }

    #[test]
    fn test_counter_reset() {
        let counter = ApiCallCounter::new();
        counter.record();
        counter.record();
        assert_eq!(counter.get(), 2);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_delay_table() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(&RemoteError::ServiceUnavailable(String::new())),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_for(&RemoteError::ServerError {
                status: 500,
                message: String::new()
            }),
            Duration::from_secs(10)
        );
        assert_eq!(
            policy.delay_for(&RemoteError::Timeout(Duration::from_secs(60))),
            Duration::ZERO
        );
        assert_eq!(
            policy.delay_for(&RemoteError::ClientError {
                status: 404,
                message: String::new()
            }),
            Duration::ZERO
        );
    }
}
