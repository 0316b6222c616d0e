//! Session configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP timeouts applied to every backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Typed session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend base URL, no trailing slash.
    pub base_url: String,
    /// Token persistence path; `None` keeps the token in memory only.
    pub token_path: Option<PathBuf>,
    pub timeouts: HttpTimeouts,
}

impl SessionConfig {
    /// Config for `base_url` with in-memory token storage and default
    /// timeouts.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token_path: None,
            timeouts: HttpTimeouts::default(),
        }
    }

    /// Build session config from environment variables.
    ///
    /// - `ANIMEKO_BASE_URL`: backend base URL (default `http://localhost:5000`)
    /// - `ANIMEKO_TOKEN_PATH`: token file path (default: in-memory only)
    /// - `ANIMEKO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ANIMEKO_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("ANIMEKO_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let token_path = std::env::var("ANIMEKO_TOKEN_PATH").ok().map(PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("ANIMEKO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ANIMEKO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self { base_url, token_path, timeouts }
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
