//! Main client for the Trello SDK.

use crate::api::*;
use crate::config::{ClientConfig, RateLimitConfig, RetryConfig, DEFAULT_BASE_URL};
use crate::error::{TrelloError, TrelloResult};
use crate::rate_limit::DualLimiter;
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Rate-limited client for the Trello REST API.
///
/// Each client owns one [`DualLimiter`] for its key/token pair. Clones share
/// it, so every clone counts against the same quotas.
#[derive(Debug, Clone)]
pub struct TrelloClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl TrelloClient {
    /// Create a new client builder.
    pub fn builder() -> TrelloClientBuilder {
        TrelloClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> TrelloResult<Self> {
        config.rate_limit.validate().map_err(TrelloError::Config)?;
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    fn from_parts(config: ClientConfig, limiter: Arc<DualLimiter>) -> TrelloResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::with_limiter(config.clone(), limiter)?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The admission gate shared by every request from this client.
    pub fn limiter(&self) -> &Arc<DualLimiter> {
        self.http.limiter()
    }

    /// Get the boards API.
    pub fn boards(&self) -> BoardsApi<'_> {
        BoardsApi::new(self)
    }

    /// Get the lists API.
    pub fn lists(&self) -> ListsApi<'_> {
        ListsApi::new(self)
    }

    /// Get the cards API.
    pub fn cards(&self) -> CardsApi<'_> {
        CardsApi::new(self)
    }

    /// Get the members API.
    pub fn members(&self) -> MembersApi<'_> {
        MembersApi::new(self)
    }

    /// Get the workspaces API.
    pub fn workspaces(&self) -> WorkspacesApi<'_> {
        WorkspacesApi::new(self)
    }
}

/// Builder for creating a TrelloClient.
pub struct TrelloClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    token: Option<String>,
    timeout: Duration,
    retry_config: RetryConfig,
    rate_limit: RateLimitConfig,
    limiter: Option<Arc<DualLimiter>>,
}

impl TrelloClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            token: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            limiter: None,
        }
    }

    /// Override the API root (defaults to `https://api.trello.com/1/`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the Trello API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the Trello access token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Set the local admission limits.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Share an existing limiter instead of creating one. Only useful for
    /// clients using the same key/token pair.
    pub fn limiter(mut self, limiter: Arc<DualLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build the client.
    pub fn build(self) -> TrelloResult<TrelloClient> {
        let api_key = non_empty(self.api_key, "api_key")?;
        let token = non_empty(self.token, "token")?;

        let mut base_url_str = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Url::join drops the last segment unless the base ends with '/'.
        if !base_url_str.ends_with('/') {
            base_url_str.push('/');
        }
        let base_url = Url::parse(&base_url_str)?;

        let config = ClientConfig {
            base_url,
            api_key,
            token,
            timeout: self.timeout,
            retry_config: self.retry_config,
            rate_limit: self.rate_limit,
        };

        match self.limiter {
            Some(limiter) => TrelloClient::from_parts(config, limiter),
            None => TrelloClient::from_config(config),
        }
    }
}

impl Default for TrelloClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: Option<String>, field: &str) -> TrelloResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TrelloError::Config(format!("{} is required", field))),
    }
}
