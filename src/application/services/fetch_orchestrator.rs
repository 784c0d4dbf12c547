//! # Fetch Orchestrator
//!
//! Produces the candidate quote pool by walking the provider chain in
//! priority order and falling back to the quote store.
//!
//! Providers are tried one at a time. The first non-empty batch wins and no
//! lower-priority provider is started. Provider failures are handled by
//! their [`FailureClass`]:
//!
//! | Class | Effect |
//! |-------|--------|
//! | `Recoverable` (and timeouts) | logged, treated as empty, next provider |
//! | `PersistenceCritical` | chain aborted, `QuoteError::Persistence` |
//! | `Unexpected` | chain aborted, `QuoteError::Orchestration` |
//!
//! When the chain yields nothing, the store is asked: every stored quote up
//! to the sample size if it holds fewer than that, otherwise a random sample.

use crate::application::error::{QuoteError, QuoteResult};
use crate::domain::entities::Quote;
use crate::infrastructure::persistence::traits::QuoteRepository;
use crate::infrastructure::providers::{FailureClass, ProviderChain, QuoteProvider};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Something that can produce a pool of quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync + fmt::Debug {
    /// Returns the current pool. An empty pool is a valid answer.
    ///
    /// # Errors
    ///
    /// Returns a [`QuoteError`] when the pool cannot be produced.
    async fn get_quotes(&self) -> QuoteResult<Vec<Quote>>;
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Store fallback threshold and sample size.
    pub fallback_sample_size: usize,
    /// Per-provider budget in milliseconds, unless the provider sets its own.
    pub provider_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_sample_size: 50,
            provider_timeout_ms: 5000,
        }
    }
}

impl OrchestratorConfig {
    /// Sets the fallback sample size (at least 1).
    #[must_use]
    pub fn with_fallback_sample_size(mut self, size: usize) -> Self {
        self.fallback_sample_size = size.max(1);
        self
    }

    /// Sets the default per-provider timeout.
    #[must_use]
    pub fn with_provider_timeout(mut self, timeout_ms: u64) -> Self {
        self.provider_timeout_ms = timeout_ms;
        self
    }
}

/// Chains providers and the store fallback into one logical fetch.
#[derive(Debug)]
pub struct QuoteFetchOrchestrator {
    chain: ProviderChain,
    repository: Arc<dyn QuoteRepository>,
    config: OrchestratorConfig,
}

impl QuoteFetchOrchestrator {
    /// Creates a new orchestrator.
    #[must_use]
    pub fn new(
        chain: ProviderChain,
        repository: Arc<dyn QuoteRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            chain,
            repository,
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs one provider under its budget and applies the failure policy.
    ///
    /// `Ok(vec![])` means "move on to the next provider".
    async fn try_provider(&self, provider: &dyn QuoteProvider) -> QuoteResult<Vec<Quote>> {
        let name = provider.name();
        let budget_ms = provider
            .timeout_ms()
            .unwrap_or(self.config.provider_timeout_ms);

        let outcome = match timeout(Duration::from_millis(budget_ms), provider.fetch_quotes()).await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(provider = name, timeout_ms = budget_ms, "quote provider timed out");
                return Ok(Vec::new());
            }
        };

        match outcome {
            Ok(quotes) => {
                if quotes.is_empty() {
                    tracing::debug!(provider = name, "quote provider returned nothing");
                }
                Ok(quotes)
            }
            Err(e) => match e.classify() {
                FailureClass::Recoverable => {
                    tracing::warn!(provider = name, error = %e, "quote provider failed, trying next");
                    Ok(Vec::new())
                }
                FailureClass::PersistenceCritical => {
                    tracing::error!(provider = name, error = %e, "quote provider hit a store failure");
                    Err(QuoteError::persistence(format!(
                        "provider {name} could not use the quote store"
                    ))
                    .caused_by(e))
                }
                FailureClass::Unexpected => {
                    tracing::error!(provider = name, error = %e, "quote provider failed unexpectedly");
                    Err(QuoteError::orchestration(format!(
                        "unexpected failure in provider {name}"
                    ))
                    .caused_by(e))
                }
            },
        }
    }

    async fn store_fallback(&self) -> QuoteResult<Vec<Quote>> {
        let limit = self.config.fallback_sample_size;
        let stored = self.repository.count().await.map_err(|e| {
            tracing::error!(error = %e, "failed to count stored quotes");
            QuoteError::from(e)
        })?;

        let quotes = if stored < limit as u64 {
            self.repository.find_all(limit).await
        } else {
            self.repository.find_random_sample(limit).await
        }
        .map_err(|e| {
            tracing::error!(error = %e, stored, "store fallback failed");
            QuoteError::from(e)
        })?;

        tracing::info!(stored, returned = quotes.len(), "served quotes from store fallback");
        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for QuoteFetchOrchestrator {
    async fn get_quotes(&self) -> QuoteResult<Vec<Quote>> {
        for provider in self.chain.providers() {
            let quotes = self.try_provider(provider.as_ref()).await?;
            if !quotes.is_empty() {
                tracing::debug!(provider = provider.name(), count = quotes.len(), "quotes fetched");
                return Ok(quotes);
            }
        }

        self.store_fallback().await
    }
}
