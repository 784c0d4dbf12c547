//! # Quote Cache
//!
//! Single-key, TTL-bounded cache in front of a [`QuoteSource`].
//!
//! Concurrent misses are collapsed into one in-flight population: the first
//! caller starts a shared load, later callers await the same future, and every
//! one of them receives the same result. The in-flight slot is a synchronous
//! lock that is never held across an `.await`.
//!
//! Every load records the cache generation it started in. [`QuoteCache::invalidate`]
//! bumps the generation and detaches any running load, which still answers
//! its own callers but no longer writes its pool back.
//!
//! An empty pool is never cached. It is reported as a [`QuoteError::Cache`]
//! and the next call tries to populate again.

use crate::application::error::{QuoteError, QuoteResult};
use crate::application::services::fetch_orchestrator::QuoteSource;
use crate::application::services::ttl_cache::{CacheStats, TtlCache};
use crate::domain::entities::Quote;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The single key under which the quote pool is cached.
pub const QUOTES_CACHE_KEY: &str = "randomQuotes";

/// A cached quote pool, cheap to clone.
pub type QuotePool = Arc<[Quote]>;

type PoolCache = TtlCache<&'static str, QuotePool>;
type SharedLoad = Shared<BoxFuture<'static, QuoteResult<QuotePool>>>;

struct InFlight {
    generation: u64,
    load: SharedLoad,
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteCacheConfig {
    /// Time-to-live after write.
    pub ttl: Duration,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl Default for QuoteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(180),
            capacity: 50,
        }
    }
}

/// Stampede-safe cache of the current quote pool.
pub struct QuoteCache {
    source: Arc<dyn QuoteSource>,
    entries: Arc<PoolCache>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    generation: Arc<AtomicU64>,
}

impl fmt::Debug for QuoteCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteCache")
            .field("source", &self.source)
            .field("entries", &self.entries)
            .field("loading", &self.in_flight.lock().is_some())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl QuoteCache {
    /// Creates a cache over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn QuoteSource>, config: QuoteCacheConfig) -> Self {
        Self {
            source,
            entries: Arc::new(TtlCache::new(config.ttl, config.capacity)),
            in_flight: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the cached pool, populating it from the source on a miss.
    ///
    /// # Errors
    ///
    /// - `QuoteError::Cache` if the source produced an empty pool or the
    ///   cached entry was unusable
    /// - any error the source returned, uncached
    pub async fn get_quotes(&self) -> QuoteResult<QuotePool> {
        if let Some(pool) = self.cached()? {
            return Ok(pool);
        }

        let load = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(running) => running.load.clone(),
                None => {
                    // A load may have finished between the first read and taking the slot.
                    if let Some(pool) = self.cached()? {
                        return Ok(pool);
                    }
                    let generation = self.generation.load(Ordering::SeqCst);
                    let load = self.start_load(generation);
                    *slot = Some(InFlight {
                        generation,
                        load: load.clone(),
                    });
                    load
                }
            }
        };

        load.await
    }

    /// Drops the cached pool so the next call repopulates.
    ///
    /// A load already running keeps serving its callers, but its result is
    /// not cached and later callers start a fresh load.
    pub fn invalidate(&self) {
        let detached = {
            let mut slot = self.in_flight.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            slot.take().is_some()
        };
        let dropped = self.entries.invalidate(&QUOTES_CACHE_KEY).is_some();
        if dropped || detached {
            tracing::debug!(dropped, detached, "quote pool invalidated");
        }
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.entries.stats()
    }

    fn cached(&self) -> QuoteResult<Option<QuotePool>> {
        match self.entries.get(&QUOTES_CACHE_KEY) {
            Some(pool) if pool.is_empty() => {
                self.entries.invalidate(&QUOTES_CACHE_KEY);
                tracing::error!(key = QUOTES_CACHE_KEY, "evicted corrupted cache entry");
                Err(QuoteError::cache("cached quote pool was empty and has been evicted"))
            }
            Some(pool) => {
                tracing::debug!(key = QUOTES_CACHE_KEY, size = pool.len(), "quote cache hit");
                Ok(Some(pool))
            }
            None => Ok(None),
        }
    }

    fn start_load(&self, started: u64) -> SharedLoad {
        let source = Arc::clone(&self.source);
        let entries = Arc::clone(&self.entries);
        let in_flight = Arc::clone(&self.in_flight);
        let generation = Arc::clone(&self.generation);

        async move {
            let result = load_pool(source.as_ref(), &entries).await;

            // Holding the slot orders this write-back against `invalidate`.
            let mut slot = in_flight.lock();
            if generation.load(Ordering::SeqCst) != started {
                tracing::debug!(key = QUOTES_CACHE_KEY, "discarding pool loaded before invalidation");
                return result;
            }
            if let Ok(pool) = &result {
                entries.insert(QUOTES_CACHE_KEY, Arc::clone(pool));
            }
            *slot = None;
            result
        }
        .boxed()
        .shared()
    }
}

async fn load_pool(source: &dyn QuoteSource, entries: &PoolCache) -> QuoteResult<QuotePool> {
    tracing::debug!(key = QUOTES_CACHE_KEY, "quote cache miss, loading");
    let loaded = source.get_quotes().await;
    entries.record_load();

    let quotes = loaded?;
    if quotes.is_empty() {
        tracing::warn!(key = QUOTES_CACHE_KEY, "quote source returned no quotes, not caching");
        return Err(QuoteError::cache("no quotes available to cache"));
    }
    Ok(quotes.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that replays scripted results, one per call.
    #[derive(Debug)]
    struct ScriptedSource {
        script: Mutex<VecDeque<QuoteResult<Vec<Quote>>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(script: Vec<QuoteResult<Vec<Quote>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn get_quotes(&self) -> QuoteResult<Vec<Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(QuoteError::orchestration("script exhausted")))
        }
    }

    fn pool(n: usize) -> Vec<Quote> {
        (0..n)
            .map(|i| Quote::new(format!("A{i}"), format!("T{i}")))
            .collect()
    }

    fn cache_over(source: &Arc<ScriptedSource>) -> QuoteCache {
        let source: Arc<dyn QuoteSource> = source.clone();
        QuoteCache::new(source, QuoteCacheConfig::default())
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(pool(3))]));
        let cache = cache_over(&source);

        assert_eq!(cache.get_quotes().await.unwrap().len(), 3);
        assert_eq!(cache.get_quotes().await.unwrap().len(), 3);

        assert_eq!(source.calls(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.loads, 1);
    }

    #[tokio::test]
    async fn concurrent_misses_load_once() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(pool(2)), Ok(pool(9))]).slow(Duration::from_millis(50)),
        );
        let cache = Arc::new(cache_over(&source));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_quotes().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 2);
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn empty_result_is_not_cached() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(Vec::new()), Ok(pool(1))]));
        let cache = cache_over(&source);

        let err = cache.get_quotes().await.unwrap_err();
        assert!(err.is_cache());

        assert_eq!(cache.get_quotes().await.unwrap().len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn source_error_propagates_uncached() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(QuoteError::persistence("db down")),
            Ok(pool(1)),
        ]));
        let cache = cache_over(&source);

        assert!(cache.get_quotes().await.unwrap_err().is_persistence());
        assert_eq!(cache.get_quotes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_error() {
        let source = Arc::new(
            ScriptedSource::new(vec![Err(QuoteError::persistence("db down"))])
                .slow(Duration::from_millis(50)),
        );
        let cache = Arc::new(cache_over(&source));

        let (a, b) = tokio::join!(cache.get_quotes(), cache.get_quotes());

        assert!(a.unwrap_err().is_persistence());
        assert!(b.unwrap_err().is_persistence());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(pool(1)), Ok(pool(4))]));
        let cache = cache_over(&source);

        cache.get_quotes().await.unwrap();
        cache.invalidate();

        assert_eq!(cache.get_quotes().await.unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_during_load_discards_the_stale_pool() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(pool(1)), Ok(pool(4))]).slow(Duration::from_millis(50)),
        );
        let cache = Arc::new(cache_over(&source));

        let stale = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get_quotes().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate();

        let (stale, fresh) = tokio::join!(stale, cache.get_quotes());
        assert_eq!(stale.unwrap().unwrap().len(), 1);
        assert_eq!(fresh.unwrap().len(), 4);

        assert_eq!(cache.get_quotes().await.unwrap().len(), 4);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_reloads() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(pool(1)), Ok(pool(2))]));
        let cache = cache_over(&source);

        cache.get_quotes().await.unwrap();
        tokio::time::advance(Duration::from_secs(181)).await;

        assert_eq!(cache.get_quotes().await.unwrap().len(), 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn corrupted_entry_is_evicted() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(pool(1))]));
        let cache = cache_over(&source);
        cache.entries.insert(QUOTES_CACHE_KEY, Arc::from(Vec::<Quote>::new()));

        assert!(cache.get_quotes().await.unwrap_err().is_cache());
        assert_eq!(cache.get_quotes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_caller_does_not_wedge_the_slot() {
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(pool(3))]).slow(Duration::from_millis(50)),
        );
        let cache = Arc::new(cache_over(&source));

        let early = tokio::time::timeout(Duration::from_millis(5), cache.get_quotes()).await;
        assert!(early.is_err());

        assert_eq!(cache.get_quotes().await.unwrap().len(), 3);
        assert_eq!(source.calls(), 1);
    }
}
