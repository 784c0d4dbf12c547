//! # Identifiers
//!
//! Strongly typed identifiers for quotes, likes and anonymous users.
//!
//! # Examples
//!
//! ```
//! use random_quotes::domain::value_objects::{QuoteId, UserId};
//!
//! let quote_id = QuoteId::new(5).unwrap();
//! assert_eq!(quote_id.get(), 5);
//!
//! let user_id = UserId::new("u1").unwrap();
//! assert_eq!(user_id.as_str(), "u1");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a persisted quote.
///
/// # Invariants
///
/// - Always strictly positive (database sequences start at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(i64);

impl QuoteId {
    /// Creates a quote id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuoteId` if `value` is zero or negative.
    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::InvalidQuoteId(value));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a persisted like row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikeId(i64);

impl LikeId {
    /// Wraps a raw like id read from storage.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LikeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longest accepted user id, in characters; matches `quote_like.user_id`.
pub const MAX_USER_ID_LEN: usize = 64;

/// Opaque identifier of an (anonymous) user.
///
/// # Invariants
///
/// - Never blank
/// - At most [`MAX_USER_ID_LEN`] characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUserId` if `value` is empty, whitespace,
    /// or longer than [`MAX_USER_ID_LEN`] characters.
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().is_empty() || value.chars().count() > MAX_USER_ID_LEN {
            return Err(DomainError::InvalidUserId);
        }
        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
