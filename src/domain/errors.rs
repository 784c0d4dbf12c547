//! # Domain Errors
//!
//! Validation failures raised while constructing domain types.

use thiserror::Error;

/// Error type for domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A quote identifier was not a positive integer.
    #[error("invalid quote id: {0}")]
    InvalidQuoteId(i64),

    /// A user identifier was blank or too long.
    #[error("invalid user id: must not be blank or longer than 64 characters")]
    InvalidUserId,

    /// A required field was missing or blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
