//! # Application Errors
//!
//! The error taxonomy every application service returns.
//!
//! # Error Hierarchy
//!
//! ```text
//! QuoteError
//! ├── Provider       - a provider failed; recoverable inside the orchestrator
//! ├── Persistence    - the store failed; aborts the operation
//! ├── Orchestration  - unexpected failure while walking the chain
//! ├── Cache          - population failed or the entry was corrupted
//! └── Argument       - missing or invalid identifiers
//! ```
//!
//! `QuoteError` is `Clone` so a single result can be handed to every caller
//! waiting on the same cache population. Causes are kept behind an `Arc`.
//!
//! # Examples
//!
//! ```
//! use random_quotes::application::error::QuoteError;
//! use random_quotes::infrastructure::persistence::RepositoryError;
//!
//! let err: QuoteError = RepositoryError::duplicate("QuoteLike", "(u1, 5)").into();
//! assert!(err.is_persistence());
//! assert!(err.is_duplicate_like());
//! ```

use crate::domain::errors::DomainError;
use crate::infrastructure::persistence::RepositoryError;
use crate::infrastructure::providers::ProviderError;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Shared, cloneable error cause.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Application layer error.
#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    /// A provider failed to fetch.
    #[error("provider error: {message}")]
    Provider {
        /// Error message.
        message: String,
        /// Wrapped cause.
        #[source]
        source: Option<Cause>,
    },

    /// The quote store failed.
    #[error("persistence error: {message}")]
    Persistence {
        /// Error message.
        message: String,
        /// Wrapped cause.
        #[source]
        source: Option<Cause>,
    },

    /// Unexpected failure during provider iteration or store fallback.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Error message.
        message: String,
        /// Wrapped cause.
        #[source]
        source: Option<Cause>,
    },

    /// Cache population failed or a cached value was unusable.
    #[error("cache error: {message}")]
    Cache {
        /// Error message.
        message: String,
        /// Wrapped cause.
        #[source]
        source: Option<Cause>,
    },

    /// Absent or invalid identifiers.
    #[error("invalid argument: {message}")]
    Argument {
        /// Error message.
        message: String,
        /// Wrapped cause.
        #[source]
        source: Option<Cause>,
    },
}

impl QuoteError {
    /// Creates a provider error.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a persistence error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an orchestration error.
    #[must_use]
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::Orchestration {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a cache error.
    #[must_use]
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an argument error.
    #[must_use]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a cause, replacing any previous one.
    #[must_use]
    pub fn caused_by(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        let cause: Cause = Arc::new(cause);
        match &mut self {
            Self::Provider { source, .. }
            | Self::Persistence { source, .. }
            | Self::Orchestration { source, .. }
            | Self::Cache { source, .. }
            | Self::Argument { source, .. } => *source = Some(cause),
        }
        self
    }

    /// Returns the error message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Provider { message, .. }
            | Self::Persistence { message, .. }
            | Self::Orchestration { message, .. }
            | Self::Cache { message, .. }
            | Self::Argument { message, .. } => message,
        }
    }

    /// Returns true for provider errors.
    #[must_use]
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Returns true for persistence errors.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Returns true for orchestration errors.
    #[must_use]
    pub fn is_orchestration(&self) -> bool {
        matches!(self, Self::Orchestration { .. })
    }

    /// Returns true for cache errors.
    #[must_use]
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache { .. })
    }

    /// Returns true for argument errors.
    #[must_use]
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument { .. })
    }

    /// Returns true if this is a persistence error caused by a like that already exists.
    #[must_use]
    pub fn is_duplicate_like(&self) -> bool {
        match self {
            Self::Persistence {
                source: Some(cause),
                ..
            } => cause
                .downcast_ref::<RepositoryError>()
                .is_some_and(RepositoryError::is_duplicate),
            _ => false,
        }
    }

    /// Returns true if this is a persistence error caused by a missing quote.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Persistence {
                source: Some(cause),
                ..
            } => cause
                .downcast_ref::<RepositoryError>()
                .is_some_and(RepositoryError::is_not_found),
            _ => false,
        }
    }
}

impl From<RepositoryError> for QuoteError {
    fn from(err: RepositoryError) -> Self {
        Self::persistence(err.to_string()).caused_by(err)
    }
}

impl From<ProviderError> for QuoteError {
    fn from(err: ProviderError) -> Self {
        Self::provider(err.to_string()).caused_by(err)
    }
}

impl From<DomainError> for QuoteError {
    fn from(err: DomainError) -> Self {
        Self::argument(err.to_string()).caused_by(err)
    }
}

/// Result type for application services.
pub type QuoteResult<T> = Result<T, QuoteError>;
