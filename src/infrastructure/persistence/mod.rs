//! # Persistence Layer
//!
//! ## Repository Traits (Ports)
//!
//! - [`QuoteRepository`]: quotes, content hashes and like counters
//! - [`QuoteLikeRepository`]: like membership through a [`LikeUnitOfWork`]
//!
//! ## Implementations
//!
//! - `in_memory`: in-memory store for tests and local runs
//! - `postgres`: PostgreSQL repositories on `sqlx`

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use traits::{
    LikeUnitOfWork, QuoteLikeRepository, QuoteRepository, RepositoryError, RepositoryResult,
};
