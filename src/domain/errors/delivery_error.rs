//! Chat platform delivery error types.

use thiserror::Error;

/// Failure talking to the Discord REST API.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DeliveryError {
    #[error("request rejected by Discord: {message}")]
    Rejected { message: String },

    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("rate limited by Discord, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("network error: {message}")]
    NetworkError { message: String },

    #[error("unexpected delivery error: {message}")]
    Unexpected { message: String },
}

impl DeliveryError {
    /// Creates rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether a later attempt could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::RateLimited { .. })
    }
}
