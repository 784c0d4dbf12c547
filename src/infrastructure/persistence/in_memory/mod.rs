//! # In-Memory Repositories
//!
//! In-memory implementations for tests and local runs without a database.
//!
//! - [`InMemoryQuoteStore`]: quote and like persistence behind a single lock

pub mod quote_store;

pub use quote_store::InMemoryQuoteStore;
