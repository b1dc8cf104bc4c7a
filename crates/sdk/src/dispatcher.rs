//! Request dispatcher: admission, execution and 429 recovery for one call.

use crate::config::RetryConfig;
use crate::error::{TrelloError, TrelloResult};
use crate::rate_limit::DualLimiter;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Runs outbound calls through a shared [`DualLimiter`] and retries the
/// ones Trello rejects with a rate-limit status.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    limiter: Arc<DualLimiter>,
    retry_config: RetryConfig,
}

impl Dispatcher {
    pub fn new(limiter: Arc<DualLimiter>, retry_config: RetryConfig) -> Self {
        Self {
            limiter,
            retry_config,
        }
    }

    pub fn limiter(&self) -> &Arc<DualLimiter> {
        &self.limiter
    }

    /// Execute `request` once admitted.
    ///
    /// A [`TrelloError::RateLimited`] result is retried after the backoff, going
    /// through admission again each time. Any other error is returned as-is.
    /// After `max_retries` rejections the call fails with
    /// [`TrelloError::RateLimitExhausted`].
    pub async fn send<T, F, Fut>(&self, mut request: F) -> TrelloResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TrelloResult<T>>,
    {
        let mut attempt = 0;

        loop {
            self.limiter.admit().await;

            match request().await {
                Err(TrelloError::RateLimited { retry_after_secs }) => {
                    if attempt >= self.retry_config.max_retries {
                        warn!(attempts = attempt + 1, "Trello kept rate limiting, giving up");
                        return Err(TrelloError::RateLimitExhausted {
                            attempts: attempt + 1,
                        });
                    }

                    let mut backoff = self.retry_config.backoff_for_attempt(attempt);
                    if let Some(secs) = retry_after_secs {
                        backoff = backoff.max(Duration::from_secs(secs));
                    }
                    warn!(
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited by Trello, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BucketConfig, RateLimitConfig};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn dispatcher(retry_config: RetryConfig) -> Dispatcher {
        let limiter = Arc::new(DualLimiter::new(&RateLimitConfig::default()));
        Dispatcher::new(limiter, retry_config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_passes_through() {
        let dispatcher = dispatcher(RetryConfig::default());

        let value = dispatcher.send(|| async { Ok::<_, TrelloError>("board") }).await.unwrap();
        assert_eq!(value, "board");
        assert_eq!(dispatcher.limiter().snapshot().token_tokens, 99);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_transparently() {
        let dispatcher = dispatcher(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let value = dispatcher
            .send(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(TrelloError::RateLimited { retry_after_secs: None })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(1000));
        // Both attempts went through admission.
        assert_eq!(dispatcher.limiter().snapshot().token_tokens, 98);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_propagates_without_backoff() {
        let dispatcher = dispatcher(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: TrelloResult<()> = dispatcher
            .send(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TrelloError::NotFound("card 5f1a not found".to_string())) }
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, TrelloError::NotFound(_)));
        assert!(err.to_string().contains("card 5f1a not found"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let dispatcher = dispatcher(RetryConfig {
            max_retries: 2,
            ..Default::default()
        });
        let calls = AtomicU32::new(0);

        let result: TrelloResult<()> = dispatcher
            .send(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TrelloError::RateLimited { retry_after_secs: None }) }
            })
            .await;

        assert!(matches!(result, Err(TrelloError::RateLimitExhausted { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_extends_backoff() {
        let dispatcher = dispatcher(RetryConfig::default());
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        dispatcher
            .send(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(TrelloError::RateLimited { retry_after_secs: Some(3) })
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_local_admission() {
        let limiter = Arc::new(DualLimiter::new(&RateLimitConfig {
            token: BucketConfig::new(1, Duration::from_secs(10)),
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(limiter, RetryConfig::default());
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        dispatcher
            .send(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(TrelloError::RateLimited { retry_after_secs: None })
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        // Second attempt needed a fresh token window, not just the 1s backoff.
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
