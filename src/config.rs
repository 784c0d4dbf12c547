//! # Configuration
//!
//! Layered settings: built-in defaults, an optional `config/quotes.{toml,yaml,json}`
//! file, then `QUOTES__`-prefixed environment variables with `__` between
//! sections, e.g. `QUOTES__SERVER__PORT=9000` or
//! `QUOTES__SERVER__CORS_ORIGINS=http://a.test,http://b.test`.

use crate::api::rest::CookieSettings;
use crate::application::services::{DuplicateLikePolicy, OrchestratorConfig, QuoteCacheConfig};
use crate::infrastructure::providers::ZenQuotesConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "QUOTES";

/// Default config file location, without extension.
pub const DEFAULT_CONFIG_PATH: &str = "config/quotes";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server.
    pub server: ServerSettings,
    /// Quote store.
    pub database: DatabaseSettings,
    /// Upstream quote providers.
    pub providers: ProvidersSettings,
    /// Quote pool cache.
    pub cache: CacheSettings,
    /// Provider chain and store fallback.
    pub orchestrator: OrchestratorSettings,
    /// Anonymous user cookie.
    pub cookie: CookieConfig,
    /// Like behavior.
    pub likes: LikesSettings,
    /// Log output.
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin without credentials.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// PostgreSQL URL; without one the in-memory store is used.
    pub url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
    /// Apply bundled migrations on startup.
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

/// Provider settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    /// ZenQuotes.
    pub zenquotes: ZenQuotesSettings,
}

/// ZenQuotes provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZenQuotesSettings {
    /// Include the provider in the chain.
    pub enabled: bool,
    /// API base URL.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    /// Budget for a whole fetch including retries.
    pub call_budget_ms: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// First backoff delay.
    pub min_backoff_ms: u64,
    /// Backoff ceiling.
    pub max_backoff_ms: u64,
    /// Requests allowed per window.
    pub rate_limit_requests: u32,
    /// Rate limit window.
    pub rate_limit_window_secs: u64,
}

impl Default for ZenQuotesSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: crate::infrastructure::providers::zen_quotes::DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 5_000,
            call_budget_ms: 30_000,
            max_retries: 3,
            min_backoff_ms: 1_000,
            max_backoff_ms: 5_000,
            rate_limit_requests: 5,
            rate_limit_window_secs: 30,
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Time-to-live after write, in seconds.
    pub ttl_secs: u64,
    /// Maximum entries.
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 180,
            capacity: 50,
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Store fallback threshold and sample size.
    pub fallback_sample_size: usize,
    /// Default per-provider budget.
    pub provider_timeout_ms: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            fallback_sample_size: defaults.fallback_sample_size,
            provider_timeout_ms: defaults.provider_timeout_ms,
        }
    }
}

/// Cookie settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Mark the cookie `Secure`.
    pub secure: bool,
    /// Lifetime in days.
    pub max_age_days: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        let defaults = CookieSettings::default();
        Self {
            secure: defaults.secure,
            max_age_days: defaults.max_age_days,
        }
    }
}

/// Like settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LikesSettings {
    /// `reject` or `idempotent`.
    pub duplicate_policy: DuplicateLikePolicy,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the file at `path` (or the default location)
    /// and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a source is malformed or a value is invalid.
    pub fn load(path: Option<&str>) -> Result<Self, SettingsError> {
        Self::from_sources(path.unwrap_or(DEFAULT_CONFIG_PATH), None)
    }

    /// Loads configuration with an explicit environment map instead of the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a source is malformed or a value is invalid.
    pub fn from_sources(
        path: &str,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
            .source(env);

        let config: Self = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` naming the first bad value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cache.ttl_secs == 0 {
            return Err(SettingsError::Invalid("cache.ttl_secs must be positive".into()));
        }
        if self.cache.capacity == 0 {
            return Err(SettingsError::Invalid("cache.capacity must be positive".into()));
        }
        if self.orchestrator.provider_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "orchestrator.provider_timeout_ms must be positive".into(),
            ));
        }
        if self.cookie.max_age_days <= 0 {
            return Err(SettingsError::Invalid("cookie.max_age_days must be positive".into()));
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid(
                "database.max_connections must be positive".into(),
            ));
        }
        let zen = &self.providers.zenquotes;
        if zen.enabled && zen.base_url.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "providers.zenquotes.base_url must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` if host and port do not form an address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| SettingsError::Invalid(format!("server address: {e}")))
    }

    /// Quote cache settings.
    #[must_use]
    pub fn cache_config(&self) -> QuoteCacheConfig {
        QuoteCacheConfig {
            ttl: Duration::from_secs(self.cache.ttl_secs),
            capacity: self.cache.capacity,
        }
    }

    /// Orchestrator settings.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_fallback_sample_size(self.orchestrator.fallback_sample_size)
            .with_provider_timeout(self.orchestrator.provider_timeout_ms)
    }

    /// ZenQuotes provider settings.
    #[must_use]
    pub fn zen_quotes_config(&self) -> ZenQuotesConfig {
        let zen = &self.providers.zenquotes;
        ZenQuotesConfig::new(zen.base_url.clone())
            .with_request_timeout_ms(zen.request_timeout_ms)
            .with_call_budget_ms(zen.call_budget_ms)
            .with_max_retries(zen.max_retries)
            .with_backoff_ms(zen.min_backoff_ms, zen.max_backoff_ms)
            .with_rate_limit(zen.rate_limit_requests, zen.rate_limit_window_secs)
    }

    /// Cookie attributes.
    #[must_use]
    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.cookie.secure,
            max_age_days: self.cookie.max_age_days,
        }
    }
}
