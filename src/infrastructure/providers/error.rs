//! # Provider Errors
//!
//! Error types for quote provider operations.
//!
//! Every [`ProviderError`] belongs to one [`FailureClass`], which is what the
//! fetch orchestrator acts on when it walks the provider chain.
//!
//! # Examples
//!
//! ```
//! use random_quotes::infrastructure::providers::error::{FailureClass, ProviderError};
//!
//! let error = ProviderError::timeout("Request timed out after 5000ms");
//! assert!(error.is_retryable());
//! assert_eq!(error.classify(), FailureClass::Recoverable);
//!
//! let error = ProviderError::persistence("bulk insert failed");
//! assert_eq!(error.classify(), FailureClass::PersistenceCritical);
//! ```

use thiserror::Error;

/// How the orchestrator must react to a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Treat as an empty result and try the next provider.
    Recoverable,
    /// The store is unhealthy; abort the whole chain.
    PersistenceCritical,
    /// Anything else; wrap and abort the chain.
    Unexpected,
}

/// Error type for quote provider operations.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Request timed out.
    #[error("provider timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Timeout duration in milliseconds.
        timeout_ms: Option<u64>,
    },

    /// Network or connection error, including upstream 5xx responses.
    #[error("provider connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Rate limit exceeded, either upstream or by the local limiter.
    #[error("provider rate limit exceeded: {message}")]
    RateLimited {
        /// Error message.
        message: String,
    },

    /// Upstream rejected the request.
    #[error("provider invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// Unparseable or unexpected response.
    #[error("provider protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// The provider could not read or write the quote store.
    #[error("provider persistence error: {message}")]
    Persistence {
        /// Error message.
        message: String,
    },

    /// Internal provider error.
    #[error("provider internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl ProviderError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with duration.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a persistence error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if a retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::RateLimited { .. }
        )
    }

    /// Classifies the failure for the orchestrator.
    ///
    /// Upstream trouble of any kind is recoverable; only store failures and
    /// internal bugs stop the chain.
    #[must_use]
    pub fn classify(&self) -> FailureClass {
        match self {
            Self::Timeout { .. }
            | Self::Connection { .. }
            | Self::RateLimited { .. }
            | Self::InvalidRequest { .. }
            | Self::Protocol { .. } => FailureClass::Recoverable,
            Self::Persistence { .. } => FailureClass::PersistenceCritical,
            Self::Internal { .. } => FailureClass::Unexpected,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
