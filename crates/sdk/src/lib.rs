//! # Trello MCP SDK
//!
//! Rate-limited Rust client for the Trello REST API.
//!
//! Every request passes through a [`DualLimiter`] holding one token bucket per
//! Trello quota (300 requests / 10 s per API key, 100 requests / 10 s per
//! token). Calls wait for capacity instead of failing, and a 429 from Trello
//! is retried through the same gate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trello_mcp_sdk::{TrelloClient, TrelloResult};
//!
//! #[tokio::main]
//! async fn main() -> TrelloResult<()> {
//!     let client = TrelloClient::builder()
//!         .api_key("your-api-key")
//!         .token("your-token")
//!         .build()?;
//!
//!     let boards = client.boards().list_mine().await?;
//!     println!("Found {} boards", boards.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Wrapping other calls
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trello_mcp_sdk::{Dispatcher, DualLimiter, RateLimitConfig, RetryConfig, TrelloResult};
//!
//! # async fn example() -> TrelloResult<()> {
//! let limiter = Arc::new(DualLimiter::new(&RateLimitConfig::default()));
//! let dispatcher = Dispatcher::new(limiter, RetryConfig::default());
//!
//! let answer = dispatcher.send(|| async { Ok(42) }).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod rate_limit;
pub mod transport;
pub mod types;

// Re-export main client
pub use client::{TrelloClient, TrelloClientBuilder};
pub use config::{AdmissionPolicy, BucketConfig, ClientConfig, RateLimitConfig, RetryConfig};
pub use dispatcher::Dispatcher;
pub use error::{TrelloError, TrelloResult};
pub use rate_limit::{DualLimiter, LimiterSnapshot, TokenBucket};
pub use types::{Action, Board, Card, CardUpdate, Label, List, Member, NewCard, Workspace};
