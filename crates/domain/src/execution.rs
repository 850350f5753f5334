//! Retrying execution strategy for units of work.

use std::future::Future;
use std::time::Duration;

use common::RequestContext;

use crate::error::DomainError;

/// Strategy that re-runs a whole unit of work after transient storage failures.
///
/// The operation passed to [`ExecutionStrategy::execute`] must be the complete
/// begin/run/commit sequence; it is replayed from the start, never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStrategy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExecutionStrategy {
    /// Runs the operation once.
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Retries up to `max_retries` times with exponential backoff capped at `max_delay`.
    pub const fn retrying(max_retries: u32, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(100),
            max_delay,
        }
    }

    /// Sets the delay before the first retry.
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the backoff before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Executes `operation`, retrying it while it fails with a transient error.
    ///
    /// The context's cancellation token is checked before every attempt and
    /// interrupts the backoff sleep. Once retries are exhausted the last
    /// transient error is returned.
    pub async fn execute<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        mut operation: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;
        loop {
            if ctx.is_cancelled() {
                return Err(DomainError::Cancelled);
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        correlation_id = %ctx.correlation_id(),
                        error = %err,
                        "transient failure, retrying unit of work"
                    );
                    metrics::counter!("transaction_retries_total").increment(1);

                    tokio::select! {
                        () = ctx.cancellation().cancelled() => return Err(DomainError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                Err(err) => {
                    if err.is_transient() && self.max_retries > 0 {
                        tracing::error!(
                            attempts = attempt + 1,
                            correlation_id = %ctx.correlation_id(),
                            error = %err,
                            "retries exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self::retrying(6, Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use common::CancellationToken;

    use super::*;

    fn fast(max_retries: u32) -> ExecutionStrategy {
        ExecutionStrategy::retrying(max_retries, Duration::from_millis(5))
            .with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let strategy = ExecutionStrategy::retrying(10, Duration::from_millis(500))
            .with_base_delay(Duration::from_millis(100));

        assert_eq!(strategy.delay_for(1), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(2), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(3), Duration::from_millis(400));
        assert_eq!(strategy.delay_for(4), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = fast(3)
            .execute(&RequestContext::new(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, DomainError>(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = fast(3)
            .execute(&RequestContext::new(), || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(DomainError::Transient("connection reset".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast(2)
            .execute(&RequestContext::new(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::Transient("still down".into()))
            })
            .await;

        assert!(matches!(result, Err(DomainError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast(5)
            .execute(&RequestContext::new(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::invalid_argument("current_status", "45"))
            })
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_retry_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = ExecutionStrategy::no_retry()
            .execute(&RequestContext::new(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::Transient("down".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_context_never_runs_operation() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancellation(token);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = fast(3)
            .execute(&ctx, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let strategy = ExecutionStrategy::retrying(5, Duration::from_secs(60))
            .with_base_delay(Duration::from_secs(60));

        let result: Result<(), _> = strategy
            .execute(&ctx, || {
                let token = token.clone();
                async move {
                    token.cancel();
                    Err(DomainError::Transient("down".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(DomainError::Cancelled)));
    }
}
