//! # Random Quotes
//!
//! A quote service that stays responsive when upstream quote providers are
//! slow, rate-limited or down.
//!
//! Quotes are acquired through a prioritized provider chain with fallback to
//! the quote store, cached behind a stampede-safe TTL cache, and served with
//! per-user likes whose denormalized counters stay consistent under
//! concurrent access.
//!
//! # Layers
//!
//! - [`domain`]: quotes, likes and their identifiers
//! - [`application`]: fetch orchestration, caching, like bookkeeping
//! - [`infrastructure`]: quote stores and upstream providers
//! - [`api`]: REST and server-sent events
//! - [`config`] and [`telemetry`]: settings and log output

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
