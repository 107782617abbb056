//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the parsed host configuration and one pooled HTTP client used by the
//! `/api` proxy.

use std::sync::Arc;
use std::time::Duration;

use crate::config::HostConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HostConfig>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build state with an HTTP client whose overall timeout matches the
    /// proxy timeout (long enough for large uploads).
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: HostConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.proxy_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.proxy_timeout))
            .build()?;
        Ok(Self { config: Arc::new(config), http })
    }
}
