//! # Application Layer
//!
//! Use cases built on the domain and the persistence and provider ports.

pub mod error;
pub mod services;

pub use error::{QuoteError, QuoteResult};
