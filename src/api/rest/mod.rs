//! # REST API
//!
//! REST endpoints using axum for the quotes service.
//!
//! Callers are identified by an anonymous `user_id` cookie that the API
//! issues on first contact.
//!
//! # Endpoints
//!
//! ## Quotes
//! - `GET /api/v1/quotes/random` - Random quote with the caller's like state
//! - `POST /api/v1/quotes/{id}/like` - Like a quote
//! - `DELETE /api/v1/quotes/{id}/like` - Remove a like
//! - `GET /api/v1/quotes/stream` - Server-sent events of liked quotes
//!
//! ## Health
//! - `GET /api/v1/health` - Health check endpoint
//!
//! # Usage
//!
//! ```ignore
//! use random_quotes::api::rest::{create_router, cors_layer, AppState, CookieSettings};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState {
//!     quotes: /* ... */,
//!     likes: /* ... */,
//!     broadcaster: /* ... */,
//!     cookie: CookieSettings::default(),
//! });
//!
//! let router = create_router(state, cors_layer(&[]));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    ApiError, AppState, CookieSettings, ErrorResponse, HealthResponse, QUOTE_LIKED_EVENT,
    QuoteResponse, USER_ID_COOKIE,
};
pub use routes::{cors_layer, create_router};
