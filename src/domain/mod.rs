//! # Domain Layer
//!
//! Quotes, likes and the identity rules that tie them together.
//!
//! - [`entities`]: [`Quote`](entities::Quote) and [`QuoteLike`](entities::QuoteLike)
//! - [`value_objects`]: identifiers and the normalized [`ContentHash`](value_objects::ContentHash)
//! - [`errors`]: validation failures

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
