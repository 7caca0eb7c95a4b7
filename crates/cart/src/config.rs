//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STORECART_API_URL` - Base URL of the cart service (e.g., `https://shop.example.com/api`)
//!
//! ## Optional
//! - `STORECART_STORAGE_DIR` - Directory holding the guest cart record (default: `.storecart`)
//! - `STORECART_CACHE_TTL_SECS` - Lifetime of a cached account cart (default: 300)
//! - `STORECART_HTTP_TIMEOUT_SECS` - Transport timeout for cart service calls (default: none)
//! - `STORECART_ACCESS_TOKEN` - Bearer token of an authenticated session

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".storecart";
const DEFAULT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct CartConfig {
    /// Cart service configuration
    pub service: CartServiceConfig,
    /// Directory holding the guest cart record
    pub storage_dir: PathBuf,
    /// Bearer token of an authenticated session, if one was configured
    pub access_token: Option<SecretString>,
}

/// Remote cart service configuration.
#[derive(Debug, Clone)]
pub struct CartServiceConfig {
    /// Base URL without a trailing slash
    pub api_url: String,
    /// How long a fetched account cart stays cached
    pub cache_ttl: Duration,
    /// Transport timeout; `None` leaves timing to the HTTP stack
    pub http_timeout: Option<Duration>,
}

impl std::fmt::Debug for CartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartConfig")
            .field("service", &self.service)
            .field("storage_dir", &self.storage_dir)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Lookup(&lookup);

        let service = CartServiceConfig {
            api_url: parse_api_url(&env.required("STORECART_API_URL")?)?,
            cache_ttl: Duration::from_secs(parse_secs(
                "STORECART_CACHE_TTL_SECS",
                &env.or_default("STORECART_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            )?),
            http_timeout: env
                .optional("STORECART_HTTP_TIMEOUT_SECS")
                .map(|v| parse_secs("STORECART_HTTP_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs),
        };

        Ok(Self {
            service,
            storage_dir: PathBuf::from(env.or_default("STORECART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            access_token: env
                .optional("STORECART_ACCESS_TOKEN")
                .filter(|token| !token.trim().is_empty())
                .map(SecretString::from),
        })
    }
}

impl CartServiceConfig {
    /// Service configuration with default cache lifetime and no timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            cache_ttl: Duration::from_secs(300),
            http_timeout: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Validate the service URL and strip any trailing slash.
fn parse_api_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("STORECART_API_URL".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STORECART_API_URL", "https://shop.test/api/")]).unwrap();
        assert_eq!(config.service.api_url, "https://shop.test/api");
        assert_eq!(config.service.cache_ttl, Duration::from_secs(300));
        assert!(config.service.http_timeout.is_none());
        assert_eq!(config.storage_dir, PathBuf::from(".storecart"));
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "STORECART_API_URL"));
    }

    #[test]
    fn test_malformed_api_url() {
        let err = load(&[("STORECART_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[("STORECART_API_URL", "ftp://shop.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_ttl() {
        let err = load(&[
            ("STORECART_API_URL", "https://shop.test"),
            ("STORECART_CACHE_TTL_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STORECART_CACHE_TTL_SECS")
        );
    }

    #[test]
    fn test_optional_values() {
        let config = load(&[
            ("STORECART_API_URL", "http://localhost:8080"),
            ("STORECART_HTTP_TIMEOUT_SECS", "15"),
            ("STORECART_STORAGE_DIR", "/var/lib/storecart"),
            ("STORECART_ACCESS_TOKEN", "tok_abc"),
        ])
        .unwrap();
        assert_eq!(config.service.api_url, "http://localhost:8080");
        assert_eq!(config.service.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/storecart"));
        assert_eq!(
            config.access_token.as_ref().unwrap().expose_secret(),
            "tok_abc"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[
            ("STORECART_API_URL", "https://shop.test"),
            ("STORECART_ACCESS_TOKEN", "super_secret_session_token"),
        ])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("shop.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_session_token"));
    }
}
