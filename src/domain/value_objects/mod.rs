//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! - [`QuoteId`], [`LikeId`]: database-backed identities
//! - [`UserId`]: anonymous user identity (cookie value)
//! - [`ContentHash`]: normalized `(author, text)` digest

pub mod content_hash;
pub mod ids;

pub use content_hash::ContentHash;
pub use ids::{LikeId, QuoteId, UserId};
