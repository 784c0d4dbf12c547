//! # Quote Like Entity
//!
//! Membership of a user in a quote's set of likers.
//!
//! At most one row exists per `(user_id, quote_id)`; the store enforces this with
//! a uniqueness constraint. Rows are created by a like, deleted by an unlike and
//! never updated in place.

use crate::domain::value_objects::{LikeId, QuoteId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A like row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuoteLike {
    /// The user liking the quote.
    pub user_id: UserId,
    /// The liked quote.
    pub quote_id: QuoteId,
    /// When the like happened (UTC).
    pub liked_at: DateTime<Utc>,
}

impl NewQuoteLike {
    /// Creates a like stamped with the current time.
    #[must_use]
    pub fn now(user_id: UserId, quote_id: QuoteId) -> Self {
        Self {
            user_id,
            quote_id,
            liked_at: Utc::now(),
        }
    }
}

/// A persisted like row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLike {
    id: LikeId,
    user_id: UserId,
    quote_id: QuoteId,
    liked_at: DateTime<Utc>,
}

impl QuoteLike {
    /// Reconstructs a like read from storage.
    #[must_use]
    pub fn from_parts(
        id: LikeId,
        user_id: UserId,
        quote_id: QuoteId,
        liked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            quote_id,
            liked_at,
        }
    }

    /// Persists a new like under the given id.
    #[must_use]
    pub fn persisted(id: LikeId, like: NewQuoteLike) -> Self {
        Self {
            id,
            user_id: like.user_id,
            quote_id: like.quote_id,
            liked_at: like.liked_at,
        }
    }

    /// Returns the row id.
    #[must_use]
    pub fn id(&self) -> LikeId {
        self.id
    }

    /// Returns the user.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the liked quote.
    #[must_use]
    pub fn quote_id(&self) -> QuoteId {
        self.quote_id
    }

    /// Returns when the like happened.
    #[must_use]
    pub fn liked_at(&self) -> DateTime<Utc> {
        self.liked_at
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn persisted_keeps_fields() {
        let new_like = NewQuoteLike::now(UserId::new("u1").unwrap(), QuoteId::new(5).unwrap());
        let liked_at = new_like.liked_at;
        let like = QuoteLike::persisted(LikeId::new(1), new_like);

        assert_eq!(like.id().get(), 1);
        assert_eq!(like.user_id().as_str(), "u1");
        assert_eq!(like.quote_id().get(), 5);
        assert_eq!(like.liked_at(), liked_at);
    }
}
