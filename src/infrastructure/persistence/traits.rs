//! # Repository Traits
//!
//! Port definitions for quote and like persistence.
//!
//! # Available Repositories
//!
//! - [`QuoteRepository`]: quotes, their content hashes and like counters
//! - [`QuoteLikeRepository`]: per-user like membership, written through a
//!   [`LikeUnitOfWork`] so the membership row and the counter change together
//!
//! # Examples
//!
//! ```ignore
//! use random_quotes::infrastructure::persistence::traits::QuoteRepository;
//!
//! async fn stored_total(repo: &impl QuoteRepository) {
//!     let total = repo.count().await.unwrap();
//!     println!("{total} quotes stored");
//! }
//! ```

use crate::domain::entities::{NewQuoteLike, Quote, QuoteLike};
use crate::domain::value_objects::{ContentHash, QuoteId, UserId};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Duplicate entity: {entity_type} with key {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Conflicting key.
        id: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Row could not be mapped to a domain type.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument passed to the store.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository for quotes.
///
/// Counter updates are conditional, store-side operations: implementations
/// must never read the counter, modify it in memory and write it back.
#[async_trait]
pub trait QuoteRepository: Send + Sync + fmt::Debug {
    /// Inserts fetched quotes attributed to `provider`.
    ///
    /// Quotes whose `(content hash, provider)` already exists are skipped
    /// silently. An empty batch is a no-op.
    async fn bulk_insert_ignoring_conflicts(
        &self,
        quotes: &[Quote],
        provider: &str,
    ) -> RepositoryResult<()>;

    /// Finds a quote by its normalized content hash.
    async fn find_by_content_hash(&self, hash: &ContentHash) -> RepositoryResult<Option<Quote>>;

    /// Finds a quote by id.
    async fn find_by_id(&self, id: QuoteId) -> RepositoryResult<Option<Quote>>;

    /// Saves a quote.
    ///
    /// Inserts when the quote has no id, otherwise updates author and text.
    /// The like counter is never written through this method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when updating an id that does not exist.
    async fn save(&self, quote: &Quote) -> RepositoryResult<Quote>;

    /// Atomically adds one like.
    ///
    /// Returns `Ok(false)` if the quote does not exist.
    async fn increment_likes(&self, id: QuoteId) -> RepositoryResult<bool>;

    /// Atomically removes one like, never going below zero.
    ///
    /// Returns `Ok(false)` if the quote does not exist or already has zero likes.
    async fn decrement_likes(&self, id: QuoteId) -> RepositoryResult<bool>;

    /// Counts all stored quotes.
    async fn count(&self) -> RepositoryResult<u64>;

    /// Counts quotes attributed to a provider.
    async fn count_by_provider(&self, provider: &str) -> RepositoryResult<u64>;

    /// Returns up to `limit` quotes in storage order.
    async fn find_all(&self, limit: usize) -> RepositoryResult<Vec<Quote>>;

    /// Returns a uniformly random sample of up to `limit` quotes.
    async fn find_random_sample(&self, limit: usize) -> RepositoryResult<Vec<Quote>>;
}

/// Repository for like membership rows.
#[async_trait]
pub trait QuoteLikeRepository: Send + Sync + fmt::Debug {
    /// Finds the like of `user_id` on `quote_id`, outside any transaction.
    async fn find_like(
        &self,
        user_id: &UserId,
        quote_id: QuoteId,
    ) -> RepositoryResult<Option<QuoteLike>>;

    /// Opens a transactional scope for a like or unlike.
    async fn begin(&self) -> RepositoryResult<Box<dyn LikeUnitOfWork>>;
}

/// A transactional scope over like rows and like counters.
///
/// Nothing is visible to other callers until [`commit`](LikeUnitOfWork::commit)
/// succeeds. Dropping the unit of work without committing rolls it back.
#[async_trait]
pub trait LikeUnitOfWork: Send {
    /// Finds the like of `user_id` on `quote_id` inside the scope.
    async fn find_like(
        &mut self,
        user_id: &UserId,
        quote_id: QuoteId,
    ) -> RepositoryResult<Option<QuoteLike>>;

    /// Inserts a like row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the user already likes the quote.
    async fn insert_like(&mut self, like: NewQuoteLike) -> RepositoryResult<QuoteLike>;

    /// Deletes the like of `user_id` on `quote_id`. Returns whether a row was removed.
    async fn delete_like(&mut self, user_id: &UserId, quote_id: QuoteId) -> RepositoryResult<bool>;

    /// Adds one like to the quote's counter. `Ok(false)` if the quote does not exist.
    async fn increment_likes(&mut self, quote_id: QuoteId) -> RepositoryResult<bool>;

    /// Removes one like, guarded by `likes > 0`. `Ok(false)` if nothing changed.
    async fn decrement_likes(&mut self, quote_id: QuoteId) -> RepositoryResult<bool>;

    /// Makes every change of the scope visible atomically.
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;
}
