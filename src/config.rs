//! Application configuration loaded from environment variables.
//!
//! The hosted backend (auth + data services) is reached with keys that are
//! injected as environment variables; they are read once at startup.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (auth + REST tables)
    pub backend_url: String,
    /// Public (anon) API key sent with auth-service calls
    pub anon_key: String,
    /// Service-role key for row queries against the data service
    pub service_key: String,
    /// HS256 secret used to validate session access tokens locally
    pub jwt_secret: Vec<u8>,
    /// Public URL of the portal frontend (cookie Secure flag, CORS)
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// Timeout applied to every auth/data service call
    pub lookup_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            anon_key: "test_anon_key".to_string(),
            service_key: "test_service_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            public_url: "http://localhost:3000".to_string(),
            port: 8080,
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `BACKEND_URL`, `BACKEND_ANON_KEY`, `BACKEND_SERVICE_KEY` and
    /// `JWT_SECRET` are required; everything else has a local-dev default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_url: env::var("BACKEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_URL"))?,
            anon_key: env::var("BACKEND_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_ANON_KEY"))?,
            service_key: env::var("BACKEND_SERVICE_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_SERVICE_KEY"))?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            lookup_timeout: env::var("LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(5)),
        })
    }

    /// Whether the portal is served over HTTPS (drives cookie Secure flag).
    pub fn is_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
