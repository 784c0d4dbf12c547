//! # Like Service
//!
//! Toggles a user's like on a quote and keeps the quote's denormalized
//! `likes` counter consistent with the membership rows.
//!
//! Each operation runs inside one [`LikeUnitOfWork`]: the membership write and
//! the counter write commit together, and any early return drops the unit of
//! work, which rolls it back.

use crate::application::error::{QuoteError, QuoteResult};
use crate::domain::entities::NewQuoteLike;
use crate::domain::value_objects::{QuoteId, UserId};
use crate::infrastructure::persistence::traits::{QuoteLikeRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do when a user likes a quote they already like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateLikePolicy {
    /// Surface the existing row as a persistence error.
    #[default]
    Reject,
    /// Succeed without changing anything; `like_quote` returns `false`.
    Idempotent,
}

/// Like/unlike operations with counter bookkeeping.
#[derive(Debug)]
pub struct LikeService {
    likes: Arc<dyn QuoteLikeRepository>,
    policy: DuplicateLikePolicy,
}

impl LikeService {
    /// Creates a service with the default [`DuplicateLikePolicy::Reject`].
    #[must_use]
    pub fn new(likes: Arc<dyn QuoteLikeRepository>) -> Self {
        Self::with_policy(likes, DuplicateLikePolicy::default())
    }

    /// Creates a service with an explicit duplicate-like policy.
    #[must_use]
    pub fn with_policy(likes: Arc<dyn QuoteLikeRepository>, policy: DuplicateLikePolicy) -> Self {
        Self { likes, policy }
    }

    /// Returns the duplicate-like policy.
    #[must_use]
    pub fn policy(&self) -> DuplicateLikePolicy {
        self.policy
    }

    /// Records a like and increments the quote's counter.
    ///
    /// Returns `true` when the like was recorded.
    ///
    /// # Errors
    ///
    /// - `QuoteError::Argument` if either id is absent
    /// - `QuoteError::Persistence` if the like already exists (under
    ///   [`DuplicateLikePolicy::Reject`]), the quote does not exist, or the
    ///   store fails
    pub async fn like_quote(&self, user_id: &str, quote_id: Option<QuoteId>) -> QuoteResult<bool> {
        let (user, quote) = validate(user_id, quote_id)?;
        let mut uow = self.likes.begin().await?;

        if uow.find_like(&user, quote).await?.is_some() {
            return self.on_duplicate(&user, quote);
        }

        match uow.insert_like(NewQuoteLike::now(user.clone(), quote)).await {
            Ok(_) => {}
            Err(e) if e.is_duplicate() => return self.on_duplicate(&user, quote),
            Err(e) => {
                tracing::error!(error = %e, user_id = %user, quote_id = %quote, "failed to insert like");
                return Err(e.into());
            }
        }

        if !uow.increment_likes(quote).await? {
            tracing::warn!(user_id = %user, quote_id = %quote, "like on missing quote rolled back");
            return Err(QuoteError::persistence(format!("quote {quote} does not exist"))
                .caused_by(RepositoryError::not_found("Quote", quote.to_string())));
        }

        uow.commit().await?;
        tracing::debug!(user_id = %user, quote_id = %quote, "quote liked");
        Ok(true)
    }

    /// Removes a like and decrements the quote's counter.
    ///
    /// Returns `false` without touching the counter when the user had not
    /// liked the quote or the row was gone by the time it was deleted;
    /// otherwise returns whether the decrement applied.
    ///
    /// # Errors
    ///
    /// - `QuoteError::Argument` if either id is absent
    /// - `QuoteError::Persistence` if the store fails
    pub async fn unlike_quote(
        &self,
        user_id: &str,
        quote_id: Option<QuoteId>,
    ) -> QuoteResult<bool> {
        let (user, quote) = validate(user_id, quote_id)?;
        let mut uow = self.likes.begin().await?;

        if uow.find_like(&user, quote).await?.is_none() {
            return Ok(false);
        }

        if !uow.delete_like(&user, quote).await? {
            tracing::debug!(user_id = %user, quote_id = %quote, "like already removed by a concurrent unlike");
            return Ok(false);
        }
        let decremented = uow.decrement_likes(quote).await?;
        uow.commit().await?;

        if !decremented {
            tracing::warn!(quote_id = %quote, "like removed but counter was already zero");
        }
        Ok(decremented)
    }

    /// Returns whether the user has liked the quote.
    ///
    /// # Errors
    ///
    /// - `QuoteError::Argument` if either id is absent
    /// - `QuoteError::Persistence` if the store fails
    pub async fn check_user_like(
        &self,
        user_id: &str,
        quote_id: Option<QuoteId>,
    ) -> QuoteResult<bool> {
        let (user, quote) = validate(user_id, quote_id)?;
        Ok(self.likes.find_like(&user, quote).await?.is_some())
    }

    fn on_duplicate(&self, user: &UserId, quote: QuoteId) -> QuoteResult<bool> {
        match self.policy {
            DuplicateLikePolicy::Reject => {
                tracing::error!(user_id = %user, quote_id = %quote, "like already exists");
                Err(QuoteError::persistence("like already exists").caused_by(
                    RepositoryError::duplicate("QuoteLike", format!("({user}, {quote})")),
                ))
            }
            DuplicateLikePolicy::Idempotent => Ok(false),
        }
    }
}

fn validate(user_id: &str, quote_id: Option<QuoteId>) -> QuoteResult<(UserId, QuoteId)> {
    let quote = quote_id.ok_or_else(|| QuoteError::argument("user id and quote id are required"))?;
    let user = UserId::new(user_id)
        .map_err(|e| QuoteError::argument("user id and quote id are required").caused_by(e))?;
    Ok((user, quote))
}
