//! Client configuration for the ceremony layer

use std::{env, time::Duration};

use thiserror::Error;
use url::Url;

const DEFAULT_SERVER_URI: &str = "http://localhost:8080";
const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_CEREMONY_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid server URI: {0}")]
    InvalidServerUri(String),

    #[error("Unsupported server URI scheme: {0}")]
    UnsupportedScheme(String),
}

/// Settings shared by every ceremony a [`CeremonyClient`](crate::CeremonyClient) runs.
///
/// The server origin is resolved once and passed in explicitly; nothing in
/// this crate reads it from global state afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the relying-party server, e.g. `http://localhost:8080`
    pub server_uri: Url,
    /// Origin the client runs on; written into client data by software authenticators
    pub origin: String,
    /// Upper bound for the native step when the server sends no timeout
    pub ceremony_timeout: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_uri: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            server_uri: parse_server_uri(server_uri)?,
            origin: DEFAULT_ORIGIN.to_string(),
            ceremony_timeout: Duration::from_secs(DEFAULT_CEREMONY_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Build the configuration from `SERVER_URI`, `ORIGIN`, `CEREMONY_TIMEOUT`
    /// and `REQUEST_TIMEOUT` (both in seconds).
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_uri =
            env::var("SERVER_URI").unwrap_or_else(|_| DEFAULT_SERVER_URI.to_string());

        Ok(Self {
            server_uri: parse_server_uri(&server_uri)?,
            origin: env::var("ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string()),
            ceremony_timeout: secs_from_env("CEREMONY_TIMEOUT", DEFAULT_CEREMONY_TIMEOUT_SECS),
            request_timeout: secs_from_env("REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn with_server_uri(mut self, server_uri: &str) -> Result<Self, ConfigError> {
        self.server_uri = parse_server_uri(server_uri)?;
        Ok(self)
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_ceremony_timeout(mut self, timeout: Duration) -> Self {
        self.ceremony_timeout = timeout;
        self
    }

    /// Absolute URL of an API path on the configured server.
    ///
    /// Any path prefix in `server_uri` is kept, so `http://host/app` and
    /// `/api/login` give `http://host/app/api/login`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_uri.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_server_uri(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidServerUri(format!("{value}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn secs_from_env(key: &str, default: u64) -> Duration {
    let secs = match env::var(key) {
        Ok(v) => v.parse::<u64>().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}: {}. Using default '{}'", key, v, default);
            default
        }),
        Err(_) => default,
    };
    Duration::from_secs(secs)
}
