//! # Provider Chain
//!
//! Ordered, statically built list of quote providers. Position in the chain
//! is priority: index 0 is tried first.

use crate::infrastructure::providers::traits::QuoteProvider;
use std::sync::Arc;

/// Ordered list of providers, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl ProviderChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> ProviderChainBuilder {
        ProviderChainBuilder::default()
    }

    /// Returns the providers in priority order.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn QuoteProvider>] {
        &self.providers
    }

    /// Returns the provider names in priority order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Builder for [`ProviderChain`].
#[derive(Debug, Default)]
pub struct ProviderChainBuilder {
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl ProviderChainBuilder {
    /// Appends a provider with lower priority than every provider already pushed.
    #[must_use]
    pub fn push(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Builds the chain.
    #[must_use]
    pub fn build(self) -> ProviderChain {
        ProviderChain {
            providers: self.providers,
        }
    }
}
