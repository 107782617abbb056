//! REST helpers for the backend HTTP API.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning an error since configuration is only
//! fetched in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Failures come back as `Err(String)`; the caller logs them and leaves the
//! session unconfigured, which keeps upload and connect disabled.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use crate::state::config::ClientConfig;

/// Endpoint serving the client configuration.
pub const CONFIG_ENDPOINT: &str = "/api/config";

#[cfg(any(test, feature = "hydrate"))]
fn config_request_failed_message(status: u16) -> String {
    format!("config request failed: {status}")
}

/// Fetch the client configuration from [`CONFIG_ENDPOINT`].
///
/// # Errors
///
/// Returns an error on transport failure, a non-2xx status, a body that is
/// not a configuration object, or when called outside the browser.
pub async fn fetch_client_config() -> Result<ClientConfig, String> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::get(CONFIG_ENDPOINT)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.ok() {
            return Err(config_request_failed_message(resp.status()));
        }
        resp.json::<ClientConfig>().await.map_err(|e| e.to_string())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Err("not available on server".to_owned())
    }
}
