//! Fixed-window token bucket.

use crate::config::BucketConfig;
use std::time::Duration;
use tokio::time::Instant;

/// A single rate ceiling: at most `capacity` consumptions per window.
///
/// Refill is a hard reset to full once a whole window has elapsed since the
/// window was anchored, not a proportional trickle. This follows Trello's
/// own fixed 10 second accounting.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u32,
    refill_interval: Duration,
    tokens: u32,
    window_started_at: Instant,
}

impl TokenBucket {
    /// Create a full bucket whose first window starts at `now`.
    pub fn new(config: BucketConfig, now: Instant) -> Self {
        Self {
            capacity: config.capacity,
            refill_interval: config.window,
            tokens: config.capacity,
            window_started_at: now,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    /// Reset to full and re-anchor the window if the current one is over.
    pub fn refill_if_window_elapsed(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window_started_at) >= self.refill_interval {
            self.tokens = self.capacity;
            self.window_started_at = now;
        }
    }

    /// Whether a token is available at `now`, without consuming it.
    pub fn has_capacity(&mut self, now: Instant) -> bool {
        self.refill_if_window_elapsed(now);
        self.tokens > 0
    }

    /// Consume one token if available. A denied call leaves the bucket untouched.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill_if_window_elapsed(now);
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Time left until the current window closes, zero if already closed.
    pub fn time_until_next_window(&self, now: Instant) -> Duration {
        self.refill_interval
            .saturating_sub(now.saturating_duration_since(self.window_started_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(capacity: u32, now: Instant) -> TokenBucket {
        TokenBucket::new(BucketConfig::new(capacity, Duration::from_secs(10)), now)
    }

    #[test]
    fn test_starts_full() {
        let now = Instant::now();
        let bucket = bucket(300, now);

        assert_eq!(bucket.tokens(), 300);
        assert_eq!(bucket.capacity(), 300);
        assert_eq!(bucket.time_until_next_window(now), Duration::from_secs(10));
    }

    #[test]
    fn test_tokens_stay_within_bounds() {
        let start = Instant::now();
        let mut bucket = bucket(3, start);

        // Mix of consumes across several windows, including long idle gaps.
        let offsets_ms = [0, 0, 0, 0, 0, 500, 9_999, 10_000, 10_001, 10_002, 10_003, 45_000, 45_001];
        for offset in offsets_ms {
            bucket.try_consume(start + Duration::from_millis(offset));
            assert!(bucket.tokens() <= bucket.capacity());
        }
    }

    #[test]
    fn test_denied_when_empty_without_side_effects() {
        let now = Instant::now();
        let mut bucket = bucket(2, now);

        assert!(bucket.try_consume(now));
        assert!(bucket.try_consume(now));
        assert!(!bucket.try_consume(now));
        assert!(!bucket.try_consume(now + Duration::from_secs(9)));
        assert_eq!(bucket.tokens(), 0);
    }

    #[test]
    fn test_window_reset_refills_to_capacity() {
        let start = Instant::now();
        let mut bucket = bucket(3, start);
        for _ in 0..3 {
            assert!(bucket.try_consume(start));
        }

        let later = start + Duration::from_secs(10);
        assert!(bucket.try_consume(later));
        assert_eq!(bucket.tokens(), 2);
        assert_eq!(bucket.time_until_next_window(later), Duration::from_secs(10));
    }

    #[test]
    fn test_refill_is_not_proportional() {
        let start = Instant::now();
        let mut bucket = bucket(4, start);
        for _ in 0..4 {
            bucket.try_consume(start);
        }

        bucket.refill_if_window_elapsed(start + Duration::from_secs(7));
        assert_eq!(bucket.tokens(), 0);
    }

    #[test]
    fn test_time_until_next_window_clamps_to_zero() {
        let start = Instant::now();
        let bucket = bucket(1, start);

        assert_eq!(
            bucket.time_until_next_window(start + Duration::from_millis(2_500)),
            Duration::from_millis(7_500)
        );
        assert_eq!(bucket.time_until_next_window(start + Duration::from_secs(60)), Duration::ZERO);
    }

    #[test]
    fn test_has_capacity_does_not_consume() {
        let now = Instant::now();
        let mut bucket = bucket(1, now);

        assert!(bucket.has_capacity(now));
        assert!(bucket.has_capacity(now));
        assert_eq!(bucket.tokens(), 1);
    }
}
