//! # REST Routes
//!
//! Router configuration for the quotes API.

use super::handlers::{self, AppState};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Creates the API router.
///
/// # Routes
///
/// - `GET /api/v1/quotes/random`
/// - `POST /api/v1/quotes/{id}/like`
/// - `DELETE /api/v1/quotes/{id}/like`
/// - `GET /api/v1/quotes/stream`
/// - `GET /api/v1/health`
pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let quotes = Router::new()
        .route("/random", get(handlers::get_random_quote))
        .route(
            "/{id}/like",
            axum::routing::post(handlers::like_quote).delete(handlers::unlike_quote),
        )
        .route("/stream", get(handlers::stream_liked_quotes));

    Router::new()
        .nest("/api/v1/quotes", quotes)
        .route("/api/v1/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Builds the CORS layer for the configured origins.
///
/// Credentials (the user cookie) are allowed only for explicit origins. With
/// no origins configured every origin is accepted without credentials.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::rest::handlers::{CookieSettings, QuoteResponse, USER_ID_COOKIE};
    use crate::application::services::{
        LikeBroadcaster, LikeService, OrchestratorConfig, QuoteCache, QuoteCacheConfig,
        QuoteFetchOrchestrator, QuoteService,
    };
    use crate::domain::entities::Quote;
    use crate::infrastructure::persistence::in_memory::InMemoryQuoteStore;
    use crate::infrastructure::providers::ProviderChain;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(store: &InMemoryQuoteStore) -> Router {
        let repository = Arc::new(store.clone());
        let orchestrator = QuoteFetchOrchestrator::new(
            ProviderChain::default(),
            repository.clone(),
            OrchestratorConfig::default(),
        );
        let cache = QuoteCache::new(Arc::new(orchestrator), QuoteCacheConfig::default());
        let state = Arc::new(AppState {
            quotes: Arc::new(QuoteService::new(Arc::new(cache), repository.clone())),
            likes: Arc::new(LikeService::new(repository)),
            broadcaster: Arc::new(LikeBroadcaster::default()),
            cookie: CookieSettings::default(),
        });
        create_router(state, cors_layer(&[]))
    }

    async fn seeded() -> (InMemoryQuoteStore, i64) {
        let store = InMemoryQuoteStore::new();
        let quotes = store
            .seed(&[Quote::new("Seneca", "Luck is what happens when preparation meets opportunity")], "p")
            .await
            .unwrap();
        (store, quotes[0].id().unwrap().get())
    }

    async fn send(app: Router, method: &str, uri: &str, user: Option<&str>) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header("cookie", format!("{USER_ID_COOKIE}={user}"));
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get("set-cookie")
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, set_cookie, payload)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let store = InMemoryQuoteStore::new();
        let (status, _, body) = send(app(&store), "GET", "/api/v1/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn random_quote_on_empty_store_is_unavailable() {
        let store = InMemoryQuoteStore::new();
        let (status, _, body) = send(app(&store), "GET", "/api/v1/quotes/random", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status_code"], 503);
    }

    #[tokio::test]
    async fn random_quote_issues_cookie() {
        let (store, id) = seeded().await;
        let (status, cookie, body) = send(app(&store), "GET", "/api/v1/quotes/random", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(cookie.unwrap().starts_with("user_id="));
        let quote: QuoteResponse = serde_json::from_value(body).unwrap();
        assert_eq!(quote.id, id);
        assert!(!quote.is_liked);
    }

    #[tokio::test]
    async fn existing_cookie_is_not_reissued() {
        let (store, _) = seeded().await;
        let (status, cookie, _) =
            send(app(&store), "GET", "/api/v1/quotes/random", Some("u1")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(cookie.is_none());
    }

    #[tokio::test]
    async fn like_then_duplicate_then_unlike() {
        let (store, id) = seeded().await;
        let app = app(&store);
        let uri = format!("/api/v1/quotes/{id}/like");

        let (status, _, body) = send(app.clone(), "POST", &uri, Some("u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["likes"], 1);
        assert_eq!(body["isLiked"], true);

        let (status, _, _) = send(app.clone(), "POST", &uri, Some("u1")).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, body) = send(app.clone(), "DELETE", &uri, Some("u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["likes"], 0);
        assert_eq!(body["isLiked"], false);
    }

    #[tokio::test]
    async fn invalid_id_is_bad_request() {
        let (store, _) = seeded().await;
        let (status, _, _) = send(app(&store), "POST", "/api/v1/quotes/0/like", Some("u1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_user_cookie_is_bad_request() {
        let (store, id) = seeded().await;
        let app = app(&store);
        let uri = format!("/api/v1/quotes/{id}/like");
        let user = "u".repeat(65);

        let (status, _, body) = send(app.clone(), "POST", &uri, Some(&user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status_code"], 400);
        let (status, _, _) = send(app, "DELETE", &uri, Some(&user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.like_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_quote_is_not_found() {
        let (store, _) = seeded().await;
        let app = app(&store);

        let (status, _, _) = send(app.clone(), "POST", "/api/v1/quotes/999/like", Some("u1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(app, "DELETE", "/api/v1/quotes/999/like", Some("u1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(store.like_count().await, 0);
    }

    #[test]
    fn cors_layers_are_usable() {
        use tower::Layer;

        let origins = [
            Vec::new(),
            vec!["*".to_string()],
            vec!["http://localhost:3000".to_string(), "not a header\n".to_string()],
        ];
        for origins in origins {
            let _service = cors_layer(&origins).layer(tower::service_fn(|_: Request<Body>| async {
                Ok::<_, std::convert::Infallible>(())
            }));
        }
    }
}
