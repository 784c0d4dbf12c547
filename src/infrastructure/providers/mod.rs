//! # Quote Providers
//!
//! External quote sources and the ordered chain the orchestrator walks.
//!
//! - [`QuoteProvider`]: port implemented by every source
//! - [`ProviderChain`]: explicit priority order, built at startup
//! - [`ZenQuotesProvider`]: ZenQuotes API adapter

pub mod chain;
pub mod error;
pub mod http_client;
pub mod traits;
pub mod zen_quotes;

pub use chain::{ProviderChain, ProviderChainBuilder};
pub use error::{FailureClass, ProviderError, ProviderResult};
pub use http_client::HttpClient;
pub use traits::QuoteProvider;
pub use zen_quotes::{ZEN_QUOTES_PROVIDER_NAME, ZenQuotesConfig, ZenQuotesProvider};
