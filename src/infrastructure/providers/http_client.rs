//! # HTTP Client Utilities
//!
//! Shared HTTP client wrapper for quote providers.
//!
//! Transport failures and non-success status codes are mapped onto
//! [`ProviderError`] so providers can decide what to retry.
//!
//! # Examples
//!
//! ```ignore
//! use random_quotes::infrastructure::providers::http_client::HttpClient;
//!
//! let client = HttpClient::new(5000)?;
//! let quotes: Vec<Payload> = client.get("https://zenquotes.io/api/quotes").await?;
//! ```

use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper for quote providers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client.
    client: Client,
    /// Request timeout in milliseconds.
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the specified timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Internal` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ProviderError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Makes a GET request and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Timeout` or `ProviderError::Connection` if the
    /// request fails, and `ProviderError::Protocol` if the body cannot be parsed.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.handle_response(response).await
    }

    /// Handles the HTTP response, checking status and deserializing JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ProviderResult<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::protocol(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Err(map_status_error(status, &error_body))
        }
    }

    /// Maps a reqwest error to a ProviderError.
    fn map_reqwest_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::timeout_with_duration("Request timed out", self.timeout_ms)
        } else if error.is_connect() {
            ProviderError::connection(format!("Connection failed: {}", error))
        } else {
            ProviderError::connection(format!("HTTP request failed: {}", error))
        }
    }
}

/// Maps an HTTP status code to a ProviderError.
fn map_status_error(status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited("Rate limit exceeded"),
        s if s.is_server_error() => {
            ProviderError::connection(format!("Server error ({}): {}", status, body))
        }
        StatusCode::NOT_FOUND => {
            ProviderError::protocol(format!("Resource not found: {}", body))
        }
        s if s.is_client_error() => {
            ProviderError::invalid_request(format!("Request rejected ({}): {}", status, body))
        }
        _ => ProviderError::protocol(format!("HTTP error ({}): {}", status, body)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_client() {
        let client = HttpClient::new(5000);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().timeout_ms(), 5000);
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            ProviderError::RateLimited { .. }
        ));
        assert!(map_status_error(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(map_status_error(StatusCode::INTERNAL_SERVER_ERROR, "").is_retryable());
        assert!(!map_status_error(StatusCode::FORBIDDEN, "").is_retryable());
        assert!(matches!(
            map_status_error(StatusCode::NOT_FOUND, "missing"),
            ProviderError::Protocol { .. }
        ));
    }
}
