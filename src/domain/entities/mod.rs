//! # Domain Entities
//!
//! - [`Quote`]: a quotation with its denormalized like counter
//! - [`QuoteLike`]: one user's like of one quote

pub mod quote;
pub mod quote_like;

pub use quote::Quote;
pub use quote_like::{NewQuoteLike, QuoteLike};
