//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PHANTO_API_URL` - Backend origin (default: `http://127.0.0.1:8000`)
//! - `PHANTO_API_TOKEN` - Pre-issued bearer token
//! - `PHANTO_EMAIL` / `PHANTO_PASSWORD` - Credentials to log in with (both or neither)
//! - `PHANTO_HTTP_TIMEOUT_SECS` - Per-request timeout (default: transport default)
//! - `PHANTO_CART_MIRROR_PATH` - Cart mirror file (default: `.phanto/cart.json`,
//!   empty string keeps the mirror in memory only)
//! - `PHANTO_PRODUCT_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `PHANTO_CATEGORY_CACHE_TTL_SECS` - Category cache lifetime (default: 600)

use std::path::PathBuf;
use std::time::Duration;

use phanto_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_CART_MIRROR_PATH: &str = ".phanto/cart.json";
const DEFAULT_PRODUCT_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CATEGORY_TTL_SECS: u64 = 10 * 60;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "placeholder", "xxx", "insert-"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Full client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend connection settings
    pub api: ApiConfig,
    /// Catalog cache settings
    pub cache: CacheConfig,
    /// Where the cart mirror is persisted; `None` keeps it in memory
    pub cart_mirror_path: Option<PathBuf>,
    /// Credentials to log in with at startup
    pub login: Option<LoginConfig>,
}

/// Backend connection settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Backend origin; always ends with `/`
    pub base_url: Url,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Pre-issued bearer token
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiConfig {
    /// Settings pointing at `base_url` with no token and no timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("PHANTO_API_URL", base_url)?,
            timeout_secs: None,
            token: None,
        })
    }
}

/// Catalog cache lifetimes.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of product lists and details
    pub product_ttl: Duration,
    /// Lifetime of category lists and details
    pub category_ttl: Duration,
    /// Maximum entries per cache
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            product_ttl: Duration::from_secs(DEFAULT_PRODUCT_TTL_SECS),
            category_ttl: Duration::from_secs(DEFAULT_CATEGORY_TTL_SECS),
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Email and password to log in with.
#[derive(Clone)]
pub struct LoginConfig {
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginConfig")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if only
    /// one of `PHANTO_EMAIL`/`PHANTO_PASSWORD` is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let base_url = vars.or_default("PHANTO_API_URL", DEFAULT_API_URL);
        let api = ApiConfig {
            base_url: parse_base_url("PHANTO_API_URL", &base_url)?,
            timeout_secs: vars.parsed("PHANTO_HTTP_TIMEOUT_SECS")?,
            token: vars
                .optional("PHANTO_API_TOKEN")
                .map(|token| validated_secret("PHANTO_API_TOKEN", token))
                .transpose()?,
        };

        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            product_ttl: vars
                .parsed("PHANTO_PRODUCT_CACHE_TTL_SECS")?
                .map_or(defaults.product_ttl, Duration::from_secs),
            category_ttl: vars
                .parsed("PHANTO_CATEGORY_CACHE_TTL_SECS")?
                .map_or(defaults.category_ttl, Duration::from_secs),
            max_capacity: defaults.max_capacity,
        };

        let cart_mirror_path = match lookup("PHANTO_CART_MIRROR_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_CART_MIRROR_PATH)),
        };

        let login = match (vars.optional("PHANTO_EMAIL"), vars.optional("PHANTO_PASSWORD")) {
            (Some(email), Some(password)) => Some(LoginConfig {
                email: Email::parse(&email).map_err(|e| {
                    ConfigError::InvalidEnvVar("PHANTO_EMAIL".to_string(), e.to_string())
                })?,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("PHANTO_PASSWORD".into())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("PHANTO_EMAIL".into())),
        };

        Ok(Self {
            api,
            cache,
            cart_mirror_path,
            login,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// A variable that is set and non-empty.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}

/// Parse the backend origin, forcing a trailing slash so relative endpoints
/// join under it.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.into(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Reject tokens that are obviously copied from a template.
fn validated_secret(key: &str, value: String) -> Result<SecretString, ConfigError> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    let secret = SecretString::from(value);
    if secret.expose_secret().len() < 16 {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            "must be at least 16 characters".to_string(),
        ));
    }
    Ok(secret)
}
