//! # ZenQuotes Provider
//!
//! Fetches batches from the ZenQuotes `/quotes` endpoint and persists them
//! under the provider's name before handing them to the orchestrator.
//!
//! # Behavior
//!
//! - Once the store holds the upstream's whole catalogue for this provider,
//!   the provider returns an empty batch and never calls upstream.
//! - Transient failures (timeouts, connection errors, 5xx, 429) are retried
//!   with exponential backoff.
//! - A client-side rate limiter mirrors the upstream free tier; calls over the
//!   limit fail with `RateLimited` without touching the network.
//! - Store failures are reported as `ProviderError::Persistence`.

use crate::domain::entities::Quote;
use crate::infrastructure::persistence::traits::QuoteRepository;
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::http_client::HttpClient;
use crate::infrastructure::providers::traits::QuoteProvider;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Name under which fetched quotes are attributed in the store.
pub const ZEN_QUOTES_PROVIDER_NAME: &str = "ZenQuotes";

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://zenquotes.io/api";

/// Number of quotes ZenQuotes serves in total.
pub const DEFAULT_CATALOGUE_SIZE: u64 = 3237;

/// Configuration for [`ZenQuotesProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZenQuotesConfig {
    base_url: String,
    request_timeout_ms: u64,
    call_budget_ms: u64,
    max_retries: u32,
    min_backoff_ms: u64,
    max_backoff_ms: u64,
    catalogue_size: u64,
    rate_limit_requests: u32,
    rate_limit_window_secs: u64,
}

impl Default for ZenQuotesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 5_000,
            call_budget_ms: 30_000,
            max_retries: 3,
            min_backoff_ms: 1_000,
            max_backoff_ms: 5_000,
            catalogue_size: DEFAULT_CATALOGUE_SIZE,
            rate_limit_requests: 5,
            rate_limit_window_secs: 30,
        }
    }
}

impl ZenQuotesConfig {
    /// Creates a config with the given base URL and default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the timeout of a single HTTP request.
    #[must_use]
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Sets the budget for a whole `fetch_quotes` call, retries included.
    #[must_use]
    pub fn with_call_budget_ms(mut self, budget_ms: u64) -> Self {
        self.call_budget_ms = budget_ms;
        self
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff bounds.
    #[must_use]
    pub fn with_backoff_ms(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_backoff_ms = min_ms;
        self.max_backoff_ms = max_ms.max(min_ms);
        self
    }

    /// Sets the stored-quote count at which upstream is no longer called.
    #[must_use]
    pub fn with_catalogue_size(mut self, size: u64) -> Self {
        self.catalogue_size = size;
        self
    }

    /// Sets the client-side rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests: u32, window_secs: u64) -> Self {
        self.rate_limit_requests = requests;
        self.rate_limit_window_secs = window_secs;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the maximum number of retries.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the catalogue size.
    #[must_use]
    pub fn catalogue_size(&self) -> u64 {
        self.catalogue_size
    }

    /// Backoff before retry number `retry` (0-based), capped at the maximum.
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2_u64.saturating_pow(retry);
        Duration::from_millis(
            self.min_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }

    /// Longest a `fetch_quotes` call can take when every attempt times out:
    /// one request per attempt plus the backoff before each retry.
    #[must_use]
    pub fn worst_case_call(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        let requests = Duration::from_millis(self.request_timeout_ms.saturating_mul(attempts));
        (0..self.max_retries).fold(requests, |total, retry| total + self.backoff_for(retry))
    }

    /// Returns the budget for a whole `fetch_quotes` call.
    #[must_use]
    pub fn call_budget(&self) -> Duration {
        Duration::from_millis(self.call_budget_ms)
    }

    fn quota(&self) -> ProviderResult<Quota> {
        let requests = NonZeroU32::new(self.rate_limit_requests)
            .ok_or_else(|| ProviderError::internal("rate limit must allow at least one request"))?;
        let period = Duration::from_secs(self.rate_limit_window_secs.max(1))
            / requests.get();
        let quota = Quota::with_period(period)
            .ok_or_else(|| ProviderError::internal("rate limit period must be positive"))?;
        Ok(quota.allow_burst(requests))
    }
}

/// Upstream payload: `q` is the text, `a` the author.
#[derive(Debug, Deserialize)]
struct ZenQuote {
    #[serde(rename = "q", default)]
    text: String,
    #[serde(rename = "a", default)]
    author: String,
}

impl ZenQuote {
    fn into_quote(self) -> Option<Quote> {
        if self.text.trim().is_empty() {
            return None;
        }
        Some(Quote::new(self.author, self.text))
    }
}

/// Quote provider backed by the ZenQuotes API.
pub struct ZenQuotesProvider {
    config: ZenQuotesConfig,
    http: HttpClient,
    repository: Arc<dyn QuoteRepository>,
    limiter: DefaultDirectRateLimiter,
}

impl std::fmt::Debug for ZenQuotesProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZenQuotesProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ZenQuotesProvider {
    /// Creates a provider that persists fetched quotes into `repository`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Internal` if the HTTP client cannot be built or
    /// the rate limit is zero.
    pub fn new(
        config: ZenQuotesConfig,
        repository: Arc<dyn QuoteRepository>,
    ) -> ProviderResult<Self> {
        let http = HttpClient::new(config.request_timeout_ms)?;
        let limiter = RateLimiter::direct(config.quota()?);
        if config.worst_case_call() > config.call_budget() {
            tracing::warn!(
                budget_ms = config.call_budget_ms,
                worst_case_ms = config.worst_case_call().as_millis() as u64,
                "ZenQuotes call budget is shorter than its retry schedule"
            );
        }
        Ok(Self {
            config,
            http,
            repository,
            limiter,
        })
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &ZenQuotesConfig {
        &self.config
    }

    async fn fetch_with_retry(&self) -> ProviderResult<Vec<ZenQuote>> {
        let url = format!("{}/quotes", self.config.base_url.trim_end_matches('/'));
        let mut retry = 0;
        loop {
            match self.http.get::<Vec<ZenQuote>>(&url).await {
                Ok(payload) => return Ok(payload),
                Err(e) if e.is_retryable() && retry < self.config.max_retries => {
                    let delay = self.config.backoff_for(retry);
                    retry += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = retry,
                        delay_ms = delay.as_millis() as u64,
                        "retrying ZenQuotes fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, retries = retry, "failed to fetch quotes from ZenQuotes");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for ZenQuotesProvider {
    fn name(&self) -> &str {
        ZEN_QUOTES_PROVIDER_NAME
    }

    fn timeout_ms(&self) -> Option<u64> {
        Some(self.config.call_budget_ms)
    }

    async fn fetch_quotes(&self) -> ProviderResult<Vec<Quote>> {
        let stored = self
            .repository
            .count_by_provider(self.name())
            .await
            .map_err(|e| ProviderError::persistence(e.to_string()))?;
        if stored >= self.config.catalogue_size {
            tracing::debug!(stored, "ZenQuotes catalogue already stored, skipping upstream");
            return Ok(Vec::new());
        }

        if self.limiter.check().is_err() {
            return Err(ProviderError::rate_limited(format!(
                "client limit of {} requests per {}s reached",
                self.config.rate_limit_requests, self.config.rate_limit_window_secs
            )));
        }

        let quotes: Vec<Quote> = self
            .fetch_with_retry()
            .await?
            .into_iter()
            .filter_map(ZenQuote::into_quote)
            .collect();
        if quotes.is_empty() {
            return Ok(quotes);
        }

        self.repository
            .bulk_insert_ignoring_conflicts(&quotes, self.name())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, count = quotes.len(), "failed to persist ZenQuotes batch");
                ProviderError::persistence(e.to_string())
            })?;

        tracing::debug!(count = quotes.len(), "fetched quotes from ZenQuotes");
        Ok(quotes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ContentHash, QuoteId};
    use crate::infrastructure::persistence::in_memory::InMemoryQuoteStore;
    use crate::infrastructure::persistence::traits::{RepositoryError, RepositoryResult};
    use crate::infrastructure::providers::error::FailureClass;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config(base_url: &str) -> ZenQuotesConfig {
        ZenQuotesConfig::new(base_url).with_backoff_ms(1, 5)
    }

    fn payload() -> serde_json::Value {
        serde_json::json!([
            {"q": "Stay hungry.", "a": "Steve Jobs", "h": "<blockquote/>"},
            {"q": "Less is more.", "a": "Mies van der Rohe", "h": "<blockquote/>"}
        ])
    }

    /// Repository whose every call fails.
    #[derive(Debug)]
    struct BrokenRepository;

    #[async_trait]
    impl QuoteRepository for BrokenRepository {
        async fn bulk_insert_ignoring_conflicts(&self, _: &[Quote], _: &str) -> RepositoryResult<()> {
            Err(RepositoryError::connection("down"))
        }
        async fn find_by_content_hash(&self, _: &ContentHash) -> RepositoryResult<Option<Quote>> {
            Err(RepositoryError::connection("down"))
        }
        async fn find_by_id(&self, _: QuoteId) -> RepositoryResult<Option<Quote>> {
            Err(RepositoryError::connection("down"))
        }
        async fn save(&self, _: &Quote) -> RepositoryResult<Quote> {
            Err(RepositoryError::connection("down"))
        }
        async fn increment_likes(&self, _: QuoteId) -> RepositoryResult<bool> {
            Err(RepositoryError::connection("down"))
        }
        async fn decrement_likes(&self, _: QuoteId) -> RepositoryResult<bool> {
            Err(RepositoryError::connection("down"))
        }
        async fn count(&self) -> RepositoryResult<u64> {
            Err(RepositoryError::connection("down"))
        }
        async fn count_by_provider(&self, _: &str) -> RepositoryResult<u64> {
            Err(RepositoryError::connection("down"))
        }
        async fn find_all(&self, _: usize) -> RepositoryResult<Vec<Quote>> {
            Err(RepositoryError::connection("down"))
        }
        async fn find_random_sample(&self, _: usize) -> RepositoryResult<Vec<Quote>> {
            Err(RepositoryError::connection("down"))
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = ZenQuotesConfig::default();
        assert_eq!(config.backoff_for(0), Duration::from_secs(1));
        assert_eq!(config.backoff_for(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for(2), Duration::from_secs(4));
        assert_eq!(config.backoff_for(3), Duration::from_secs(5));
        assert_eq!(config.backoff_for(40), Duration::from_secs(5));
    }

    #[test]
    fn default_budget_covers_every_retry() {
        let config = ZenQuotesConfig::default();
        // 4 x 5 s timeouts plus 1 + 2 + 4 s of backoff.
        assert_eq!(config.worst_case_call(), Duration::from_secs(27));
        assert!(config.worst_case_call() <= config.call_budget());

        let tight = config.with_call_budget_ms(20_000);
        assert!(tight.worst_case_call() > tight.call_budget());
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let store = Arc::new(InMemoryQuoteStore::new());
        let config = ZenQuotesConfig::default().with_rate_limit(0, 30);
        assert!(ZenQuotesProvider::new(config, store).is_err());
    }

    #[tokio::test]
    async fn fetches_and_persists_quotes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        let provider = ZenQuotesProvider::new(fast_config(&server.uri()), store.clone()).unwrap();

        let quotes = provider.fetch_quotes().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].author(), "Steve Jobs");
        assert!(quotes.iter().all(|q| q.id().is_none()));
        assert_eq!(
            store.count_by_provider(ZEN_QUOTES_PROVIDER_NAME).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn skips_upstream_once_catalogue_is_stored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        store
            .seed(&[Quote::new("A", "T")], ZEN_QUOTES_PROVIDER_NAME)
            .await
            .unwrap();
        let config = fast_config(&server.uri()).with_catalogue_size(1);
        let provider = ZenQuotesProvider::new(config, store).unwrap();

        assert!(provider.fetch_quotes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retries_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        let provider = ZenQuotesProvider::new(fast_config(&server.uri()), store).unwrap();

        assert_eq!(provider.fetch_quotes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_are_recoverable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        let provider = ZenQuotesProvider::new(fast_config(&server.uri()), store).unwrap();

        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, ProviderError::Connection { .. }));
        assert_eq!(err.classify(), FailureClass::Recoverable);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        let provider = ZenQuotesProvider::new(fast_config(&server.uri()), store).unwrap();

        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn store_failure_is_persistence_critical() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(0)
            .mount(&server)
            .await;

        let provider =
            ZenQuotesProvider::new(fast_config(&server.uri()), Arc::new(BrokenRepository)).unwrap();

        let err = provider.fetch_quotes().await.unwrap_err();
        assert_eq!(err.classify(), FailureClass::PersistenceCritical);
    }

    #[tokio::test]
    async fn local_rate_limit_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload()))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        let config = fast_config(&server.uri()).with_rate_limit(1, 30);
        let provider = ZenQuotesProvider::new(config, store).unwrap();

        provider.fetch_quotes().await.unwrap();
        let err = provider.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn blank_entries_are_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"q": "  ", "a": "Nobody"},
                {"q": "Keep going.", "a": "Unknown"}
            ])))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryQuoteStore::new());
        let provider = ZenQuotesProvider::new(fast_config(&server.uri()), store).unwrap();

        let quotes = provider.fetch_quotes().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].text(), "Keep going.");
    }
}
