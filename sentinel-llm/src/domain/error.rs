//! Inference backend error types

use std::time::Duration;

/// Failure talking to a reasoning backend.
///
/// These errors never cross the consensus boundary: the resilient wrapper
/// absorbs them into abstentions after the retry budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {message}")]
    RateLimited {
        /// Seconds to wait before retrying, when the backend said so
        retry_after: Option<u64>,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Backend returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("Adapter configuration error: {0}")]
    Configuration(String),
}

impl InferenceError {
    /// Whether a single retry is worth attempting
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Network(_)
                | Self::Timeout { .. }
                | Self::ServiceUnavailable(_)
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { seconds: 0 }
        } else if err.is_connect() {
            Self::Network(format!("Connection failed: {}", err))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for InferenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(format!("JSON parse error: {}", err))
    }
}
