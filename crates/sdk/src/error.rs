//! Error types for the Trello SDK.

use serde::{Deserialize, Serialize};

/// Result type for SDK operations.
pub type TrelloResult<T> = Result<T, TrelloError>;

/// Error types that can occur when talking to the Trello API.
#[derive(Debug, thiserror::Error)]
pub enum TrelloError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("Trello API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Trello rejected the key/token pair.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Trello answered with 429.
    #[error("Rate limited by Trello, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Trello kept answering 429 after every retry.
    #[error("Rate limited by Trello, giving up after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TrelloError {
    /// Check if this error is a remote rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create an error from a non-success status code and response body.
    pub fn from_response(status: u16, body: &str, retry_after_secs: Option<u64>) -> Self {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(resp) => resp
                .message
                .or(resp.error)
                .unwrap_or_else(|| body.to_string()),
            Err(_) => body.trim().to_string(),
        };

        match status {
            429 => Self::RateLimited { retry_after_secs },
            401 => Self::Authentication(message),
            404 => Self::NotFound(message),
            _ => Self::Api { status, message },
        }
    }
}

/// Error body returned by Trello. Depending on the endpoint it carries
/// `message`, `error`, or is plain text.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
