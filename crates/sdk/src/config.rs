//! Configuration types for the Trello SDK.

use std::time::Duration;
use url::Url;

/// Default Trello REST API root.
pub const DEFAULT_BASE_URL: &str = "https://api.trello.com/1/";

/// Configuration for the Trello client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Trello REST API.
    pub base_url: Url,
    /// Trello API key.
    pub api_key: String,
    /// Trello access token for the member.
    pub token: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration for 429 responses.
    pub retry_config: RetryConfig,
    /// Local admission limits.
    pub rate_limit: RateLimitConfig,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL and credentials.
    pub fn new(base_url: Url, api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Configuration for retrying remote rate-limit rejections.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after a 429 before giving up.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier. `1.0` keeps the delay fixed.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }
}

/// One token bucket ceiling: `capacity` calls per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketConfig {
    pub capacity: u32,
    pub window: Duration,
}

impl BucketConfig {
    pub const fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window }
    }
}

/// How waiting callers are admitted once capacity frees up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Each waiter re-checks on its own poll timer. No ordering guarantee.
    #[default]
    Polling,
    /// Waiters are admitted strictly in arrival order.
    Fifo,
}

/// Local admission limits, mirroring Trello's published quotas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Ceiling shared by every token issued for the API key.
    pub api_key: BucketConfig,
    /// Ceiling for the single access token.
    pub token: BucketConfig,
    /// Sleep between admission re-checks while throttled.
    pub poll_interval: Duration,
    pub policy: AdmissionPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api_key: BucketConfig::new(300, Duration::from_secs(10)),
            token: BucketConfig::new(100, Duration::from_secs(10)),
            poll_interval: Duration::from_millis(50),
            policy: AdmissionPolicy::Polling,
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (scope, bucket) in [("api_key", &self.api_key), ("token", &self.token)] {
            if bucket.capacity == 0 {
                return Err(format!("{} bucket capacity must be > 0", scope));
            }
            if bucket.window.is_zero() {
                return Err(format!("{} bucket window must be > 0", scope));
            }
        }
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_fixed_by_default() {
        let config = RetryConfig::default();

        assert_eq!(config.backoff_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.backoff_for_attempt(3), Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_exponential_capped_at_max() {
        let config = RetryConfig {
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_millis(5000),
            ..Default::default()
        };

        assert_eq!(config.backoff_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.backoff_for_attempt(10), Duration::from_millis(5000));
    }

    #[test]
    fn test_retry_config_no_retry() {
        let config = RetryConfig::no_retry();

        assert_eq!(config.max_retries, 0);
        assert_eq!(config.initial_backoff, Duration::from_millis(1000));
    }

    #[test]
    fn test_rate_limit_defaults_match_trello_quotas() {
        let config = RateLimitConfig::default();

        assert_eq!(config.api_key, BucketConfig::new(300, Duration::from_secs(10)));
        assert_eq!(config.token, BucketConfig::new(100, Duration::from_secs(10)));
        assert_eq!(config.policy, AdmissionPolicy::Polling);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_limit_validate_rejects_zero_capacity() {
        let config = RateLimitConfig {
            token: BucketConfig::new(0, Duration::from_secs(10)),
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.contains("token"));
    }

    #[test]
    fn test_client_config_new() {
        let url = Url::parse(DEFAULT_BASE_URL).unwrap();
        let config = ClientConfig::new(url.clone(), "key", "token");

        assert_eq!(config.base_url, url);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_config.max_retries, 5);
    }
}
