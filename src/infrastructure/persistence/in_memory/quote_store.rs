//! # In-Memory Quote Store
//!
//! In-memory implementation of [`QuoteRepository`] and [`QuoteLikeRepository`]
//! for tests and local runs without a database.
//!
//! All state sits behind one `tokio::sync::Mutex`. A [`LikeUnitOfWork`] holds
//! the lock for its whole lifetime and works on a staged copy, which is swapped
//! in on commit and discarded on drop.

use crate::domain::entities::{NewQuoteLike, Quote, QuoteLike};
use crate::domain::value_objects::{ContentHash, LikeId, QuoteId, UserId};
use crate::infrastructure::persistence::traits::{
    LikeUnitOfWork, QuoteLikeRepository, QuoteRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
struct StoredQuote {
    quote: Quote,
    hash: ContentHash,
    provider: Option<String>,
}

#[derive(Debug, Clone)]
struct StoreState {
    quotes: BTreeMap<QuoteId, StoredQuote>,
    likes: HashMap<(UserId, QuoteId), QuoteLike>,
    next_quote_id: i64,
    next_like_id: i64,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            quotes: BTreeMap::new(),
            likes: HashMap::new(),
            next_quote_id: 1,
            next_like_id: 1,
        }
    }
}

impl StoreState {
    fn insert_quote(&mut self, quote: &Quote, provider: Option<&str>) -> RepositoryResult<Quote> {
        let id = QuoteId::new(self.next_quote_id)
            .map_err(|e| RepositoryError::internal(e.to_string()))?;
        self.next_quote_id += 1;

        let stored = Quote::from_parts(id, quote.author().to_string(), quote.text().to_string(), 0);
        self.quotes.insert(
            id,
            StoredQuote {
                quote: stored.clone(),
                hash: quote.content_hash(),
                provider: provider.map(str::to_string),
            },
        );
        Ok(stored)
    }

    fn contains(&self, hash: &ContentHash, provider: &str) -> bool {
        self.quotes
            .values()
            .any(|q| &q.hash == hash && q.provider.as_deref() == Some(provider))
    }

    fn increment(&mut self, id: QuoteId) -> RepositoryResult<bool> {
        match self.quotes.get_mut(&id) {
            Some(stored) => {
                let likes = stored
                    .quote
                    .likes()
                    .checked_add(1)
                    .ok_or_else(|| RepositoryError::internal(format!("like counter overflow on quote {id}")))?;
                stored.quote = stored.quote.clone().with_likes(likes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn decrement(&mut self, id: QuoteId) -> bool {
        match self.quotes.get_mut(&id) {
            Some(stored) if stored.quote.likes() > 0 => {
                let likes = stored.quote.likes() - 1;
                stored.quote = stored.quote.clone().with_likes(likes);
                true
            }
            _ => false,
        }
    }

    fn insert_like(&mut self, like: NewQuoteLike) -> RepositoryResult<QuoteLike> {
        let key = (like.user_id.clone(), like.quote_id);
        if self.likes.contains_key(&key) {
            return Err(RepositoryError::duplicate(
                "QuoteLike",
                format!("({}, {})", like.user_id, like.quote_id),
            ));
        }
        let id = LikeId::new(self.next_like_id);
        self.next_like_id += 1;

        let like = QuoteLike::persisted(id, like);
        self.likes.insert(key, like.clone());
        Ok(like)
    }
}

fn sample(quotes: Vec<Quote>, limit: usize) -> Vec<Quote> {
    let mut rng = rand::thread_rng();
    quotes.choose_multiple(&mut rng, limit).cloned().collect()
}

/// In-memory quote and like store.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuoteStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryQuoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores quotes as if they came from `provider`, returning them with ids.
    ///
    /// Unlike [`QuoteRepository::bulk_insert_ignoring_conflicts`] duplicates are
    /// not filtered, which keeps fixtures predictable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Internal` if the id sequence is exhausted.
    pub async fn seed(&self, quotes: &[Quote], provider: &str) -> RepositoryResult<Vec<Quote>> {
        let mut state = self.state.lock().await;
        quotes
            .iter()
            .map(|quote| state.insert_quote(quote, Some(provider)))
            .collect()
    }

    /// Returns the number of like rows.
    pub async fn like_count(&self) -> usize {
        self.state.lock().await.likes.len()
    }
}

#[async_trait]
impl QuoteRepository for InMemoryQuoteStore {
    async fn bulk_insert_ignoring_conflicts(
        &self,
        quotes: &[Quote],
        provider: &str,
    ) -> RepositoryResult<()> {
        if quotes.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        for quote in quotes {
            if !state.contains(&quote.content_hash(), provider) {
                state.insert_quote(quote, Some(provider))?;
            }
        }
        Ok(())
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> RepositoryResult<Option<Quote>> {
        let state = self.state.lock().await;
        Ok(state
            .quotes
            .values()
            .find(|q| &q.hash == hash)
            .map(|q| q.quote.clone()))
    }

    async fn find_by_id(&self, id: QuoteId) -> RepositoryResult<Option<Quote>> {
        let state = self.state.lock().await;
        Ok(state.quotes.get(&id).map(|q| q.quote.clone()))
    }

    async fn save(&self, quote: &Quote) -> RepositoryResult<Quote> {
        let mut state = self.state.lock().await;
        let Some(id) = quote.id() else {
            return state.insert_quote(quote, None);
        };
        let stored = state
            .quotes
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("Quote", id.to_string()))?;
        stored.quote = Quote::from_parts(
            id,
            quote.author().to_string(),
            quote.text().to_string(),
            stored.quote.likes(),
        );
        stored.hash = quote.content_hash();
        Ok(stored.quote.clone())
    }

    async fn increment_likes(&self, id: QuoteId) -> RepositoryResult<bool> {
        self.state.lock().await.increment(id)
    }

    async fn decrement_likes(&self, id: QuoteId) -> RepositoryResult<bool> {
        Ok(self.state.lock().await.decrement(id))
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.state.lock().await.quotes.len() as u64)
    }

    async fn count_by_provider(&self, provider: &str) -> RepositoryResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .quotes
            .values()
            .filter(|q| q.provider.as_deref() == Some(provider))
            .count() as u64)
    }

    async fn find_all(&self, limit: usize) -> RepositoryResult<Vec<Quote>> {
        let state = self.state.lock().await;
        Ok(state
            .quotes
            .values()
            .take(limit)
            .map(|q| q.quote.clone())
            .collect())
    }

    async fn find_random_sample(&self, limit: usize) -> RepositoryResult<Vec<Quote>> {
        if limit == 0 {
            return Err(RepositoryError::invalid_argument("sample limit must be positive"));
        }
        let all: Vec<Quote> = {
            let state = self.state.lock().await;
            state.quotes.values().map(|q| q.quote.clone()).collect()
        };
        Ok(sample(all, limit))
    }
}

#[async_trait]
impl QuoteLikeRepository for InMemoryQuoteStore {
    async fn find_like(
        &self,
        user_id: &UserId,
        quote_id: QuoteId,
    ) -> RepositoryResult<Option<QuoteLike>> {
        let state = self.state.lock().await;
        Ok(state.likes.get(&(user_id.clone(), quote_id)).cloned())
    }

    async fn begin(&self) -> RepositoryResult<Box<dyn LikeUnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryLikeUnitOfWork { guard, staged }))
    }
}

/// Unit of work over a staged copy of the store.
#[derive(Debug)]
struct InMemoryLikeUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
}

#[async_trait]
impl LikeUnitOfWork for InMemoryLikeUnitOfWork {
    async fn find_like(
        &mut self,
        user_id: &UserId,
        quote_id: QuoteId,
    ) -> RepositoryResult<Option<QuoteLike>> {
        Ok(self.staged.likes.get(&(user_id.clone(), quote_id)).cloned())
    }

    async fn insert_like(&mut self, like: NewQuoteLike) -> RepositoryResult<QuoteLike> {
        self.staged.insert_like(like)
    }

    async fn delete_like(&mut self, user_id: &UserId, quote_id: QuoteId) -> RepositoryResult<bool> {
        Ok(self
            .staged
            .likes
            .remove(&(user_id.clone(), quote_id))
            .is_some())
    }

    async fn increment_likes(&mut self, quote_id: QuoteId) -> RepositoryResult<bool> {
        self.staged.increment(quote_id)
    }

    async fn decrement_likes(&mut self, quote_id: QuoteId) -> RepositoryResult<bool> {
        Ok(self.staged.decrement(quote_id))
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quotes(n: usize) -> Vec<Quote> {
        (0..n)
            .map(|i| Quote::new(format!("Author {i}"), format!("Text {i}")))
            .collect()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = InMemoryQuoteStore::new();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.find_all(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_insert_skips_conflicts_per_provider() {
        let store = InMemoryQuoteStore::new();
        let batch = vec![
            Quote::new("Author", "Text"),
            Quote::new(" author ", "TEXT"),
            Quote::new("Other", "Thing"),
        ];

        store.bulk_insert_ignoring_conflicts(&batch, "zenquotes").await.unwrap();
        store.bulk_insert_ignoring_conflicts(&batch, "zenquotes").await.unwrap();
        assert_eq!(store.count_by_provider("zenquotes").await.unwrap(), 2);

        store.bulk_insert_ignoring_conflicts(&batch, "other").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 4);
        assert_eq!(store.count_by_provider("other").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_bulk_insert_is_a_no_op() {
        let store = InMemoryQuoteStore::new();
        store.bulk_insert_ignoring_conflicts(&[], "zenquotes").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_content_hash_normalizes() {
        let store = InMemoryQuoteStore::new();
        store.seed(&[Quote::new("Seneca", "Hello")], "p").await.unwrap();

        let found = store
            .find_by_content_hash(&Quote::new(" seneca", "HELLO ").content_hash())
            .await
            .unwrap();
        assert_eq!(found.unwrap().author(), "Seneca");
    }

    #[tokio::test]
    async fn save_inserts_then_updates_without_touching_likes() {
        let store = InMemoryQuoteStore::new();
        let saved = store.save(&Quote::new("A", "one")).await.unwrap();
        let id = saved.id().unwrap();
        store.increment_likes(id).await.unwrap();

        let updated = store
            .save(&Quote::new("A", "one, revised").with_id(id).with_likes(99))
            .await
            .unwrap();
        assert_eq!(updated.text(), "one, revised");
        assert_eq!(updated.likes(), 1);
    }

    #[tokio::test]
    async fn save_unknown_id_is_not_found() {
        let store = InMemoryQuoteStore::new();
        let ghost = Quote::new("A", "t").with_id(QuoteId::new(404).unwrap());
        assert!(store.save(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn decrement_never_goes_below_zero() {
        let store = InMemoryQuoteStore::new();
        let seeded = store.seed(&quotes(1), "p").await.unwrap();
        let id = seeded[0].id().unwrap();

        assert!(!store.decrement_likes(id).await.unwrap());
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes(), 0);

        assert!(store.increment_likes(id).await.unwrap());
        assert!(store.decrement_likes(id).await.unwrap());
        assert!(!store.decrement_likes(id).await.unwrap());
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes(), 0);
    }

    #[tokio::test]
    async fn counters_on_missing_quote_return_false() {
        let store = InMemoryQuoteStore::new();
        let missing = QuoteId::new(9).unwrap();
        assert!(!store.increment_likes(missing).await.unwrap());
        assert!(!store.decrement_likes(missing).await.unwrap());
    }

    #[tokio::test]
    async fn random_sample_is_bounded_and_distinct() {
        let store = InMemoryQuoteStore::new();
        store.seed(&quotes(20), "p").await.unwrap();

        let sample = store.find_random_sample(5).await.unwrap();
        assert_eq!(sample.len(), 5);
        let mut ids: Vec<_> = sample.iter().map(|q| q.id().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);

        assert_eq!(store.find_random_sample(50).await.unwrap().len(), 20);
        assert!(store.find_random_sample(0).await.is_err());
    }

    #[tokio::test]
    async fn find_all_respects_limit() {
        let store = InMemoryQuoteStore::new();
        store.seed(&quotes(10), "p").await.unwrap();
        assert_eq!(store.find_all(3).await.unwrap().len(), 3);
        assert_eq!(store.find_all(50).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn unit_of_work_commits_atomically() {
        let store = InMemoryQuoteStore::new();
        let id = store.seed(&quotes(1), "p").await.unwrap()[0].id().unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.insert_like(NewQuoteLike::now(user("u1"), id)).await.unwrap();
        assert!(uow.increment_likes(id).await.unwrap());
        uow.commit().await.unwrap();

        assert!(store.find_like(&user("u1"), id).await.unwrap().is_some());
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes(), 1);
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = InMemoryQuoteStore::new();
        let id = store.seed(&quotes(1), "p").await.unwrap()[0].id().unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_like(NewQuoteLike::now(user("u1"), id)).await.unwrap();
            uow.increment_likes(id).await.unwrap();
        }

        assert!(store.find_like(&user("u1"), id).await.unwrap().is_none());
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().likes(), 0);
        assert_eq!(store.like_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_like_is_rejected() {
        let store = InMemoryQuoteStore::new();
        let id = store.seed(&quotes(1), "p").await.unwrap()[0].id().unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.insert_like(NewQuoteLike::now(user("u1"), id)).await.unwrap();
        let err = uow
            .insert_like(NewQuoteLike::now(user("u1"), id))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }
}
