//! # Quote Provider Trait
//!
//! Port definition for external quote sources.
//!
//! A provider returns a non-empty batch on success, an empty batch when it
//! genuinely has nothing to offer, or a [`ProviderError`](super::error::ProviderError).
//!
//! # Examples
//!
//! ```ignore
//! use random_quotes::infrastructure::providers::traits::QuoteProvider;
//!
//! #[derive(Debug)]
//! struct StaticProvider(Vec<Quote>);
//!
//! #[async_trait::async_trait]
//! impl QuoteProvider for StaticProvider {
//!     fn name(&self) -> &str { "static" }
//!     async fn fetch_quotes(&self) -> ProviderResult<Vec<Quote>> { Ok(self.0.clone()) }
//! }
//! ```

use crate::domain::entities::Quote;
use crate::infrastructure::providers::error::ProviderResult;
use async_trait::async_trait;
use std::fmt;

/// Trait for a single external source of quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync + fmt::Debug {
    /// Returns the provider name used for store attribution.
    fn name(&self) -> &str;

    /// Per-call budget in milliseconds for one `fetch_quotes` call.
    ///
    /// `None` means the orchestrator's default budget applies.
    fn timeout_ms(&self) -> Option<u64> {
        None
    }

    /// Fetches a batch of quotes.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Timeout`, `Connection`, `RateLimited` - transient upstream failures
    /// - `ProviderError::Persistence` - the provider could not use the quote store
    async fn fetch_quotes(&self) -> ProviderResult<Vec<Quote>>;
}
