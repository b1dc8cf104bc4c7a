// Server configuration: optional TOML file overridden by environment variables

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use trello_mcp_sdk::config::DEFAULT_BASE_URL;
use trello_mcp_sdk::{AdmissionPolicy, BucketConfig, RateLimitConfig, RetryConfig, TrelloClient};

/// Config file looked up in the working directory when `TRELLO_MCP_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "trello-mcp.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub trello: TrelloConfig,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrelloConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Board made active at startup.
    #[serde(default)]
    pub board_id: Option<String>,

    /// Workspace made active at startup.
    #[serde(default)]
    pub workspace_id: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            token: None,
            base_url: default_base_url(),
            board_id: None,
            workspace_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicySetting {
    #[default]
    Polling,
    Fifo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_api_key_capacity")]
    pub api_key_capacity: u32,

    #[serde(default = "default_token_capacity")]
    pub token_capacity: u32,

    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub policy: PolicySetting,
}

fn default_api_key_capacity() -> u32 {
    300
}

fn default_token_capacity() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            api_key_capacity: default_api_key_capacity(),
            token_capacity: default_token_capacity(),
            window_ms: default_window_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            policy: PolicySetting::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl McpConfig {
    /// Load the config file if it exists, otherwise use defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path).with_context(|| {
                format!("Failed to read configuration file {}", config_path.display())
            })?;
            toml::from_str(&content).with_context(|| {
                format!("Failed to parse configuration file {}", config_path.display())
            })
        } else {
            tracing::info!(path = %config_path.display(), "Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from `TRELLO_MCP_CONFIG` (or the default file) and apply environment overrides.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("TRELLO_MCP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::load(&path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Override file values with non-empty environment variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("TRELLO_API_KEY") {
            self.trello.api_key = Some(v);
        }
        if let Some(v) = var("TRELLO_TOKEN") {
            self.trello.token = Some(v);
        }
        if let Some(v) = var("TRELLO_BASE_URL") {
            self.trello.base_url = v;
        }
        if let Some(v) = var("TRELLO_BOARD_ID") {
            self.trello.board_id = Some(v);
        }
        if let Some(v) = var("TRELLO_WORKSPACE_ID") {
            self.trello.workspace_id = Some(v);
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        let window = Duration::from_millis(self.rate_limit.window_ms);
        RateLimitConfig {
            api_key: BucketConfig::new(self.rate_limit.api_key_capacity, window),
            token: BucketConfig::new(self.rate_limit.token_capacity, window),
            poll_interval: Duration::from_millis(self.rate_limit.poll_interval_ms),
            policy: match self.rate_limit.policy {
                PolicySetting::Polling => AdmissionPolicy::Polling,
                PolicySetting::Fifo => AdmissionPolicy::Fifo,
            },
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            initial_backoff: Duration::from_millis(self.retry.backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            backoff_multiplier: self.retry.backoff_multiplier,
        }
    }

    /// Build a Trello client. Fails if credentials are missing.
    pub fn build_client(&self) -> Result<TrelloClient> {
        let Some(api_key) = self.trello.api_key.as_deref() else {
            bail!("TRELLO_API_KEY is not set (environment or [trello] api_key)");
        };
        let Some(token) = self.trello.token.as_deref() else {
            bail!("TRELLO_TOKEN is not set (environment or [trello] token)");
        };
        if !(self.retry.backoff_multiplier >= 1.0) {
            bail!("retry.backoff_multiplier must be >= 1.0");
        }

        TrelloClient::builder()
            .base_url(self.trello.base_url.clone())
            .api_key(api_key)
            .token(token)
            .timeout(Duration::from_secs(self.trello.timeout_secs))
            .rate_limit(self.rate_limit_config())
            .retry_config(self.retry_config())
            .build()
            .context("Failed to create Trello client")
    }
}
