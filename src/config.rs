//! Host configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 300;
/// Path of the realtime endpoint, both on this host and on the backend.
pub const CHANNEL_PATH: &str = "/ws";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be an {expected} URL, got '{value}'")]
    InvalidUrl { var: &'static str, expected: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub port: u16,
    /// Base URL for proxied `/api/*` requests, without a trailing slash.
    pub backend_url: String,
    /// Full websocket URL the `/ws` bridge dials.
    pub backend_ws_url: String,
    pub proxy_timeout: Duration,
}

impl HostConfig {
    /// Build typed host config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `BACKEND_URL`: default `http://127.0.0.1:5000`
    /// - `BACKEND_WS_URL`: default derived from `BACKEND_URL` + `/ws`
    /// - `PROXY_TIMEOUT_SECS`: default 300
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`HostConfig::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// See [`HostConfig::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let backend_url = lookup("BACKEND_URL")
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        if !has_scheme(&backend_url, &["http://", "https://"]) {
            return Err(ConfigError::InvalidUrl { var: "BACKEND_URL", expected: "http(s)", value: backend_url });
        }

        let backend_ws_url = match lookup("BACKEND_WS_URL") {
            Some(url) => url,
            None => derive_ws_url(&backend_url),
        };
        if !has_scheme(&backend_ws_url, &["ws://", "wss://"]) {
            return Err(ConfigError::InvalidUrl { var: "BACKEND_WS_URL", expected: "ws(s)", value: backend_ws_url });
        }

        let proxy_timeout_secs = match lookup("PROXY_TIMEOUT_SECS") {
            Some(raw) => parse_number("PROXY_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_PROXY_TIMEOUT_SECS,
        };

        Ok(Self { port, backend_url, backend_ws_url, proxy_timeout: Duration::from_secs(proxy_timeout_secs) })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber { var, value: raw.to_owned() })
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes.iter().any(|scheme| url.starts_with(scheme))
}

/// `http://host:5000` → `ws://host:5000/ws`, `https://…` → `wss://…/ws`.
fn derive_ws_url(backend_url: &str) -> String {
    let base = backend_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{swapped}{CHANNEL_PATH}")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
