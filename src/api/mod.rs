//! # API Layer
//!
//! Inbound adapters exposing the application services.
//!
//! - [`rest`]: axum REST and server-sent events endpoints

pub mod rest;
