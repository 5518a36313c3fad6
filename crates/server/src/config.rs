//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FARMSTAND_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `FARMSTAND_BASE_URL` - Public URL for the API (drives the Secure cookie flag)
//! - `FARMSTAND_SESSION_SECRET` - Session signing secret (min 32 chars, no placeholders)
//!
//! ## Optional
//! - `FARMSTAND_HOST` - Bind address (default: 127.0.0.1)
//! - `FARMSTAND_PORT` - Listen port (default: 3000)
//! - `GEOIP_DB_PATH` - MaxMind City database file (default: GeoLite2-City.mmdb)
//! - `DEFAULT_CITY_SLUG` - Fallback city when IP resolution fails (default: boston-ma)
//! - `DEFAULT_LOOKUP_RADIUS` - Catalog search radius in miles (default: 20)
//! - `LOCATION_TTL_SECS` - Lifetime of a resolved location; also the viewer
//!   cookie max-age (default: 14 days)
//! - `VIEWER_COOKIE_NAME` - Anonymous viewer id cookie (default: `fs_viewer`)
//! - `COOKIE_DOMAIN` - Domain attribute for the viewer cookie
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "todo",
    "fixme",
];

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

/// Farmstand server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Location resolution configuration
    pub location: LocationConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Location resolution and caching configuration.
#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// Path to the MaxMind City database file
    pub geoip_db_path: String,
    /// Slug of the city substituted when IP resolution fails
    pub default_city_slug: String,
    /// Default catalog search radius in miles
    pub default_lookup_radius: i32,
    /// Lifetime of a cached resolved location; also the viewer cookie max-age
    pub ttl: Duration,
    /// Name of the anonymous viewer id cookie
    pub viewer_cookie_name: String,
    /// Domain attribute for the viewer cookie
    pub cookie_domain: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FARMSTAND_DATABASE_URL")?;
        let host = get_env_or_default("FARMSTAND_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FARMSTAND_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FARMSTAND_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FARMSTAND_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("FARMSTAND_BASE_URL")?;
        let session_secret = get_required_secret("FARMSTAND_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "FARMSTAND_SESSION_SECRET")?;

        let location = LocationConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            location,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the deployment serves HTTPS (drives Secure cookie flags).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl LocationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_lookup_radius = get_env_or_default("DEFAULT_LOOKUP_RADIUS", "20")
            .parse::<i32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("DEFAULT_LOOKUP_RADIUS".to_string(), e.to_string())
            })?;

        // One knob for both the cache entry TTL and the viewer cookie
        // max-age, so the two cannot drift apart.
        let ttl_secs = get_env_or_default("LOCATION_TTL_SECS", "1209600")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("LOCATION_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            geoip_db_path: get_env_or_default("GEOIP_DB_PATH", "GeoLite2-City.mmdb"),
            default_city_slug: get_env_or_default("DEFAULT_CITY_SLUG", "boston-ma"),
            default_lookup_radius,
            ttl: Duration::from_secs(ttl_secs),
            viewer_cookie_name: get_env_or_default("VIEWER_COOKIE_NAME", "fs_viewer"),
            cookie_domain: get_optional_env("COOKIE_DOMAIN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            location: LocationConfig {
                geoip_db_path: "GeoLite2-City.mmdb".to_string(),
                default_city_slug: "boston-ma".to_string(),
                default_lookup_radius: 20,
                ttl: Duration::from_secs(1_209_600),
                viewer_cookie_name: "fs_viewer".to_string(),
                cookie_domain: None,
            },
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_session_secret_placeholder() {
        let secret = SecretString::from("changeme-changeme-changeme-changeme");
        let err = validate_session_secret(&secret, "TEST_SESSION").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_session_secret_valid() {
        let secret = SecretString::from("qN8rT2vXmW4kJ7bL0pZ5aY3hG6cF9dE1");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://farmstand.example".to_string();
        assert!(config.is_secure());
    }
}
