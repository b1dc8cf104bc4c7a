//! Dual-scope admission gate.

use super::bucket::TokenBucket;
use crate::config::{AdmissionPolicy, RateLimitConfig};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Remaining tokens in each bucket at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSnapshot {
    pub api_key_tokens: u32,
    pub token_tokens: u32,
    /// Time until the earlier of the two windows closes.
    pub next_window_in: Duration,
}

#[derive(Debug)]
struct BucketPair {
    api_key: TokenBucket,
    token: TokenBucket,
}

/// Gate that admits a call only when both the API-key bucket and the
/// access-token bucket have a token, consuming one from each together.
///
/// `admit()` never fails; it waits for capacity instead.
#[derive(Debug)]
pub struct DualLimiter {
    buckets: Mutex<BucketPair>,
    poll_interval: Duration,
    policy: AdmissionPolicy,
    // Held for the whole wait under `AdmissionPolicy::Fifo`. tokio's mutex
    // grants the lock in request order.
    queue: tokio::sync::Mutex<()>,
}

impl DualLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let now = Instant::now();
        Self {
            buckets: Mutex::new(BucketPair {
                api_key: TokenBucket::new(config.api_key, now),
                token: TokenBucket::new(config.token, now),
            }),
            poll_interval: config.poll_interval,
            policy: config.policy,
            queue: tokio::sync::Mutex::new(()),
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Wait until both buckets have capacity, then consume one token from each.
    pub async fn admit(&self) {
        match self.policy {
            AdmissionPolicy::Polling => self.poll_until_admitted().await,
            AdmissionPolicy::Fifo => {
                let _turn = self.queue.lock().await;
                self.poll_until_admitted().await;
            }
        }
    }

    /// Single non-waiting attempt. Either both buckets are debited or neither is.
    pub fn try_admit(&self) -> bool {
        let now = Instant::now();
        let mut pair = self.lock();
        let api_key_ok = pair.api_key.has_capacity(now);
        let token_ok = pair.token.has_capacity(now);
        if !(api_key_ok && token_ok) {
            return false;
        }
        pair.api_key.try_consume(now) && pair.token.try_consume(now)
    }

    pub fn snapshot(&self) -> LimiterSnapshot {
        let now = Instant::now();
        let mut pair = self.lock();
        pair.api_key.refill_if_window_elapsed(now);
        pair.token.refill_if_window_elapsed(now);
        LimiterSnapshot {
            api_key_tokens: pair.api_key.tokens(),
            token_tokens: pair.token.tokens(),
            next_window_in: pair
                .api_key
                .time_until_next_window(now)
                .min(pair.token.time_until_next_window(now)),
        }
    }

    async fn poll_until_admitted(&self) {
        let mut throttled_since: Option<Instant> = None;
        loop {
            if self.try_admit() {
                if let Some(since) = throttled_since {
                    debug!(
                        waited_ms = since.elapsed().as_millis() as u64,
                        "Admitted after local throttling"
                    );
                }
                return;
            }
            if throttled_since.is_none() {
                let snapshot = self.snapshot();
                warn!(
                    api_key_tokens = snapshot.api_key_tokens,
                    token_tokens = snapshot.token_tokens,
                    next_window_ms = snapshot.next_window_in.as_millis() as u64,
                    "Local rate limit reached, waiting for capacity"
                );
                throttled_since = Some(Instant::now());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketPair> {
        // Bucket state stays consistent even if a holder panicked.
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BucketConfig;
    use std::sync::Arc;

    fn config(api_key: BucketConfig, token: BucketConfig, policy: AdmissionPolicy) -> RateLimitConfig {
        RateLimitConfig {
            api_key,
            token,
            poll_interval: Duration::from_millis(50),
            policy,
        }
    }

    fn ten_seconds(capacity: u32) -> BucketConfig {
        BucketConfig::new(capacity, Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_throttle() {
        let limiter = DualLimiter::new(&config(ten_seconds(5), ten_seconds(100), AdmissionPolicy::Polling));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.admit().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.admit().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(limiter.snapshot().api_key_tokens, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_call_pending_before_window_boundary() {
        let limiter = DualLimiter::new(&config(ten_seconds(5), ten_seconds(5), AdmissionPolicy::Polling));
        for _ in 0..5 {
            limiter.admit().await;
        }

        let early = tokio::time::timeout(Duration::from_millis(9_900), limiter.admit()).await;
        assert!(early.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_partial_debit_while_waiting_on_other_bucket() {
        // Token bucket empties first; API-key bucket has a longer window so
        // any leaked debit would be visible.
        let limiter = DualLimiter::new(&config(
            BucketConfig::new(5, Duration::from_secs(60)),
            ten_seconds(1),
            AdmissionPolicy::Polling,
        ));
        let start = Instant::now();

        limiter.admit().await;
        assert_eq!(limiter.snapshot().api_key_tokens, 4);
        assert_eq!(limiter.snapshot().token_tokens, 0);

        let waited = tokio::time::timeout(Duration::from_secs(5), limiter.admit()).await;
        assert!(waited.is_err());
        assert_eq!(limiter.snapshot().api_key_tokens, 4);

        limiter.admit().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
        let snapshot = limiter.snapshot();
        assert_eq!(snapshot.api_key_tokens, 3);
        assert_eq!(snapshot.token_tokens, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_admit_denies_without_consuming() {
        let limiter = DualLimiter::new(&config(ten_seconds(2), ten_seconds(1), AdmissionPolicy::Polling));

        assert!(limiter.try_admit());
        assert!(!limiter.try_admit());
        assert!(!limiter.try_admit());

        let snapshot = limiter.snapshot();
        assert_eq!(snapshot.api_key_tokens, 1);
        assert_eq!(snapshot.token_tokens, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_over_admit() {
        let limiter = Arc::new(DualLimiter::new(&config(
            ten_seconds(300),
            ten_seconds(4),
            AdmissionPolicy::Polling,
        )));
        let start = Instant::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.admit().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut waits = Vec::new();
        for handle in handles {
            waits.push(handle.await.unwrap());
        }

        // 4 per window: 4 immediately, 4 after one window, 2 after two.
        let immediate = waits.iter().filter(|w| **w < Duration::from_secs(10)).count();
        let second = waits
            .iter()
            .filter(|w| **w >= Duration::from_secs(10) && **w < Duration::from_secs(20))
            .count();
        let third = waits
            .iter()
            .filter(|w| **w >= Duration::from_secs(20) && **w < Duration::from_secs(30))
            .count();
        assert_eq!(immediate, 4);
        assert_eq!(second, 4);
        assert_eq!(third, 2);
        assert_eq!(waits.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_admits_in_arrival_order() {
        let limiter = Arc::new(DualLimiter::new(&config(
            ten_seconds(300),
            ten_seconds(1),
            AdmissionPolicy::Fifo,
        )));
        assert_eq!(limiter.policy(), AdmissionPolicy::Fifo);
        limiter.admit().await;

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for id in 0..3 {
            let limiter = limiter.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                limiter.admit().await;
                order.lock().unwrap().push(id);
            }));
            // Let the task reach the queue before spawning the next one.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_releases_fifo_queue() {
        let limiter = DualLimiter::new(&config(ten_seconds(300), ten_seconds(1), AdmissionPolicy::Fifo));
        limiter.admit().await;

        let abandoned = tokio::time::timeout(Duration::from_secs(1), limiter.admit()).await;
        assert!(abandoned.is_err());

        let start = Instant::now();
        limiter.admit().await;
        assert!(start.elapsed() <= Duration::from_secs(10));
    }
}
