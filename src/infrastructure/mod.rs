//! # Infrastructure Layer
//!
//! Adapters for the quote store and external quote providers.

pub mod persistence;
pub mod providers;
