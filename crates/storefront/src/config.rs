//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MONARCA_API_URL` - Base URL of the remote storefront API
//!
//! ## Optional
//! - `MONARCA_STORAGE_DIR` - Directory for persisted client state
//!   (default: `.monarca`)
//! - `MONARCA_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".monarca";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote API. Always ends with a trailing slash so
    /// endpoint paths can be joined onto it.
    pub api_url: Url,
    /// Directory where persisted client state is written.
    pub storage_dir: PathBuf,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `MONARCA_API_URL` is missing or not a valid
    /// URL, or if the timeout is not a number. A missing API URL is fatal;
    /// there is no default.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("MONARCA_API_URL")?;
        let api_url = parse_base_url(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("MONARCA_API_URL".to_string(), e))?;

        let storage_dir =
            PathBuf::from(get_env_or_default("MONARCA_STORAGE_DIR", DEFAULT_STORAGE_DIR));

        let timeout_secs = get_env_or_default(
            "MONARCA_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("MONARCA_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            storage_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build a configuration directly, normalizing the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not a valid URL.
    pub fn new(api_url: &str, storage_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_base_url(api_url)
                .map_err(|e| ConfigError::InvalidEnvVar("api_url".to_string(), e))?,
            storage_dir: storage_dir.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
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

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL, ensuring a trailing slash so joins keep the full path.
fn parse_base_url(s: &str) -> Result<Url, String> {
    let normalized = if s.ends_with('/') {
        s.to_owned()
    } else {
        format!("{s}/")
    };
    let url = Url::parse(&normalized).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    Ok(url)
}
