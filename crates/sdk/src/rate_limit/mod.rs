//! Local admission control for outbound Trello calls.
//!
//! Trello enforces two independent quotas: 300 requests per 10 seconds per
//! API key and 100 requests per 10 seconds per token. [`DualLimiter`] keeps a
//! [`TokenBucket`] for each and only lets a call through when both agree.

mod bucket;
mod limiter;

pub use bucket::TokenBucket;
pub use limiter::{DualLimiter, LimiterSnapshot};
