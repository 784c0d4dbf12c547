//! # REST Handlers
//!
//! Request handlers, DTOs and error mapping for the quotes API.
//!
//! Every quote endpoint identifies the caller by an anonymous `user_id`
//! cookie. A request without one gets a fresh UUID v4 cookie in the response.

use crate::application::error::QuoteError;
use crate::application::services::{
    LikeBroadcaster, LikeService, QuoteLikedEvent, QuoteService,
};
use crate::domain::entities::Quote;
use crate::domain::value_objects::QuoteId;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Name of the anonymous user id cookie.
pub const USER_ID_COOKIE: &str = "user_id";

/// SSE event name for liked quotes.
pub const QUOTE_LIKED_EVENT: &str = "quote-liked";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

// ============================================================================
// Application State
// ============================================================================

/// Attributes of the `user_id` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    /// Only send the cookie over HTTPS.
    pub secure: bool,
    /// Cookie lifetime in days.
    pub max_age_days: i64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            max_age_days: 365,
        }
    }
}

/// Shared application state for handlers.
#[derive(Debug)]
pub struct AppState {
    /// Quote reads.
    pub quotes: Arc<QuoteService>,
    /// Like/unlike operations.
    pub likes: Arc<LikeService>,
    /// Liked-quote fan-out.
    pub broadcaster: Arc<LikeBroadcaster>,
    /// User cookie attributes.
    pub cookie: CookieSettings,
}

// ============================================================================
// DTOs
// ============================================================================

/// A quote as seen by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Quote id.
    pub id: i64,
    /// Quote author.
    pub author: String,
    /// Quote text.
    pub text: String,
    /// Total likes.
    pub likes: u32,
    /// Whether the requesting user liked this quote.
    pub is_liked: bool,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Error message.
    pub message: String,
    /// When the error occurred.
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Creates an error response stamped with the current time.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Quote cache hits so far.
    pub cache_hits: u64,
    /// Quote cache misses so far.
    pub cache_misses: u64,
    /// Open liked-quote streams.
    pub live_subscribers: usize,
    /// Current server time.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// An application error, mapped by category.
    Quote(QuoteError),
    /// The requested quote does not exist.
    NotFound(String),
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Quote(e) if e.is_argument() => StatusCode::BAD_REQUEST,
            Self::Quote(e) if e.is_duplicate_like() => StatusCode::CONFLICT,
            Self::Quote(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Quote(e) if e.is_provider() || e.is_cache() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Quote(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        Self::Quote(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::NotFound(message) => message.clone(),
            Self::Quote(e) if status.is_server_error() => {
                tracing::error!(error = %e, status = status.as_u16(), "request failed");
                e.message().to_string()
            }
            Self::Quote(e) => e.message().to_string(),
        };
        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Helpers
// ============================================================================

/// Returns the caller's user id, issuing a new cookie if there is none.
fn resolve_user(jar: CookieJar, settings: &CookieSettings) -> (CookieJar, String) {
    if let Some(existing) = jar.get(USER_ID_COOKIE) {
        let value = existing.value().trim();
        if !value.is_empty() {
            let value = value.to_string();
            return (jar, value);
        }
    }

    let user_id = Uuid::new_v4().to_string();
    let cookie = Cookie::build((USER_ID_COOKIE, user_id.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(settings.secure)
        .max_age(time::Duration::days(settings.max_age_days))
        .build();
    tracing::debug!(user_id = %user_id, "issued anonymous user id");
    (jar.add(cookie), user_id)
}

fn parse_quote_id(raw: i64) -> ApiResult<QuoteId> {
    QuoteId::new(raw).map_err(|e| ApiError::Quote(e.into()))
}

async fn quote_response(state: &AppState, user_id: &str, quote: &Quote) -> ApiResult<QuoteResponse> {
    let id = quote
        .id()
        .ok_or_else(|| QuoteError::persistence("stored quote has no id"))?;
    let is_liked = state.likes.check_user_like(user_id, Some(id)).await?;
    Ok(QuoteResponse {
        id: id.get(),
        author: quote.author().to_string(),
        text: quote.text().to_string(),
        likes: quote.likes(),
        is_liked,
    })
}

async fn load_quote(state: &AppState, id: QuoteId) -> ApiResult<Quote> {
    state
        .quotes
        .get_quote_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("quote {id} not found")))
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /api/v1/quotes/random`
///
/// # Errors
///
/// 404 if the picked quote is not stored, 503 if no quotes are available.
pub async fn get_random_quote(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<QuoteResponse>)> {
    let (jar, user_id) = resolve_user(jar, &state.cookie);
    let quote = state
        .quotes
        .get_random_quote()
        .await?
        .ok_or_else(|| ApiError::NotFound("no quote available".to_string()))?;
    let response = quote_response(&state, &user_id, &quote).await?;
    Ok((jar, Json(response)))
}

/// `POST /api/v1/quotes/{id}/like`
///
/// Records the like and publishes the updated quote to live streams.
///
/// # Errors
///
/// 400 for an invalid id, 404 for an unknown quote, 409 if already liked.
pub async fn like_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<QuoteResponse>)> {
    let (jar, user_id) = resolve_user(jar, &state.cookie);
    let quote_id = parse_quote_id(id)?;

    let recorded = state.likes.like_quote(&user_id, Some(quote_id)).await?;
    let quote = load_quote(&state, quote_id).await?;

    if recorded {
        if let Some(event) = QuoteLikedEvent::from_quote(&quote) {
            let delivered = state.broadcaster.emit(event);
            tracing::debug!(quote_id = %quote_id, delivered, "published liked quote");
        }
    }

    let response = quote_response(&state, &user_id, &quote).await?;
    Ok((jar, Json(response)))
}

/// `DELETE /api/v1/quotes/{id}/like`
///
/// # Errors
///
/// 400 for an invalid id, 404 for an unknown quote.
pub async fn unlike_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<QuoteResponse>)> {
    let (jar, user_id) = resolve_user(jar, &state.cookie);
    let quote_id = parse_quote_id(id)?;

    state.likes.unlike_quote(&user_id, Some(quote_id)).await?;
    let quote = load_quote(&state, quote_id).await?;

    let response = quote_response(&state, &user_id, &quote).await?;
    Ok((jar, Json(response)))
}

/// `GET /api/v1/quotes/stream`
///
/// Server-sent events of liked quotes, starting with the most recent ones.
#[allow(clippy::unused_async)]
pub async fn stream_liked_quotes(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.broadcaster.stream().filter_map(|liked| async move {
        match Event::default().event(QUOTE_LIKED_EVENT).json_data(&liked) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!(error = %e, quote_id = %liked.id, "failed to serialize liked quote");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// `GET /api/v1/health`
#[allow(clippy::unused_async)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.quotes.cache_stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_hits: stats.hits,
        cache_misses: stats.misses,
        live_subscribers: state.broadcaster.subscriber_count(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::RepositoryError;

    #[test]
    fn error_status_mapping() {
        let cases = [
            (QuoteError::argument("bad id"), StatusCode::BAD_REQUEST),
            (
                RepositoryError::duplicate("QuoteLike", "(u, 1)").into(),
                StatusCode::CONFLICT,
            ),
            (
                QuoteError::persistence("gone").caused_by(RepositoryError::not_found("Quote", "1")),
                StatusCode::NOT_FOUND,
            ),
            (QuoteError::provider("down"), StatusCode::SERVICE_UNAVAILABLE),
            (QuoteError::cache("empty"), StatusCode::SERVICE_UNAVAILABLE),
            (QuoteError::persistence("db"), StatusCode::INTERNAL_SERVER_ERROR),
            (QuoteError::orchestration("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn existing_cookie_is_reused() {
        let jar = CookieJar::new().add(Cookie::new(USER_ID_COOKIE, "abc"));
        let (jar, user) = resolve_user(jar, &CookieSettings::default());
        assert_eq!(user, "abc");
        assert_eq!(jar.iter().count(), 1);
    }

    #[test]
    fn missing_cookie_is_issued() {
        let settings = CookieSettings {
            secure: true,
            max_age_days: 365,
        };
        let (jar, user) = resolve_user(CookieJar::new(), &settings);

        let cookie = jar.get(USER_ID_COOKIE).unwrap();
        assert_eq!(cookie.value(), user);
        assert!(Uuid::parse_str(&user).is_ok());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(365)));
    }

    #[test]
    fn blank_cookie_is_replaced() {
        let jar = CookieJar::new().add(Cookie::new(USER_ID_COOKIE, "  "));
        let (_, user) = resolve_user(jar, &CookieSettings::default());
        assert!(Uuid::parse_str(&user).is_ok());
    }

    #[test]
    fn quote_response_uses_camel_case() {
        let json = serde_json::to_value(QuoteResponse {
            id: 1,
            author: "A".into(),
            text: "T".into(),
            likes: 2,
            is_liked: true,
        })
        .unwrap();
        assert_eq!(json["isLiked"], true);
        assert_eq!(json["likes"], 2);
    }
}
