//! # Application Services
//!
//! - [`QuoteFetchOrchestrator`]: provider chain with store fallback
//! - [`QuoteCache`]: single-flight TTL cache over the orchestrator
//! - [`QuoteService`]: random quote selection and lookups
//! - [`LikeService`]: like/unlike with counter bookkeeping
//! - [`LikeBroadcaster`]: fan-out of liked-quote events

pub mod fetch_orchestrator;
pub mod like_broadcast;
pub mod like_service;
pub mod quote_cache;
pub mod quote_service;
pub mod ttl_cache;

pub use fetch_orchestrator::{OrchestratorConfig, QuoteFetchOrchestrator, QuoteSource};
pub use like_broadcast::{LikeBroadcaster, QuoteLikedEvent};
pub use like_service::{DuplicateLikePolicy, LikeService};
pub use quote_cache::{QUOTES_CACHE_KEY, QuoteCache, QuoteCacheConfig, QuotePool};
pub use quote_service::QuoteService;
pub use ttl_cache::{CacheStats, TtlCache};
