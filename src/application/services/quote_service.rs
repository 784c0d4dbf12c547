//! # Quote Service
//!
//! Web-facing quote reads: a random quote from the cached pool, lookups by id
//! and updates.

use crate::application::error::{QuoteError, QuoteResult};
use crate::application::services::quote_cache::QuoteCache;
use crate::application::services::ttl_cache::CacheStats;
use crate::domain::entities::Quote;
use crate::domain::value_objects::QuoteId;
use crate::infrastructure::persistence::traits::QuoteRepository;
use rand::Rng;
use std::sync::Arc;

/// Quote reads and updates.
#[derive(Debug)]
pub struct QuoteService {
    cache: Arc<QuoteCache>,
    repository: Arc<dyn QuoteRepository>,
}

impl QuoteService {
    /// Creates a new service.
    #[must_use]
    pub fn new(cache: Arc<QuoteCache>, repository: Arc<dyn QuoteRepository>) -> Self {
        Self { cache, repository }
    }

    /// Picks a random quote from the cached pool.
    ///
    /// Pool entries fresh from a provider carry no id; those are resolved
    /// against the store by content hash so the caller sees the persisted
    /// id and like count. `None` means the quote is not stored.
    ///
    /// # Errors
    ///
    /// Returns whatever the cache or the store lookup fails with.
    pub async fn get_random_quote(&self) -> QuoteResult<Option<Quote>> {
        let pool = self.cache.get_quotes().await?;
        let Some(picked) = pick_random(&pool) else {
            return Ok(None);
        };

        if picked.is_persisted() {
            return Ok(Some(picked));
        }

        let hash = picked.content_hash();
        let stored = self.repository.find_by_content_hash(&hash).await?;
        if stored.is_none() {
            tracing::warn!(author = picked.author(), hash = %hash, "cached quote not found in store");
        }
        Ok(stored)
    }

    /// Looks up a quote by id.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Persistence` if the store fails.
    pub async fn get_quote_by_id(&self, id: QuoteId) -> QuoteResult<Option<Quote>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Updates a stored quote's author and text.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Persistence` if the quote has no id, does not
    /// exist, or the store fails.
    pub async fn update_quote(&self, quote: &Quote) -> QuoteResult<Quote> {
        if quote.id().is_none() {
            return Err(QuoteError::persistence("quote id must not be empty for update"));
        }
        Ok(self.repository.save(quote).await?)
    }

    /// Returns statistics of the underlying quote cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn pick_random(pool: &[Quote]) -> Option<Quote> {
    if pool.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..pool.len());
    pool.get(index).cloned()
}
