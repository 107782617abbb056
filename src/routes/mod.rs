//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the backend passthroughs (`/api/*` over HTTP, `/ws` as
//! a websocket bridge) and stitches them with Leptos SSR rendering under a
//! single Axum router. The compiled WASM bundle is served from `/pkg`.

pub mod proxy;
pub mod ws;

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{any, get};
use leptos::prelude::*;
use leptos_axum::{LeptosRoutes, generate_route_list};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Backend passthrough routes.
pub(crate) fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/{*path}", any(proxy::proxy_api))
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        // Video uploads are streamed through untouched.
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(state)
}

/// Full application: passthroughs + Leptos SSR + static assets.
///
/// # Errors
///
/// Returns an error if the Leptos configuration cannot be loaded (missing or
/// malformed `Cargo.toml` `[package.metadata.leptos]` section).
pub fn app(state: AppState) -> Result<Router, String> {
    let conf = get_configuration(None).map_err(|e| format!("leptos configuration: {e}"))?;
    let leptos_options = conf.leptos_options;
    let routes = generate_route_list(client::app::App);

    let leptos_router = Router::new()
        .leptos_routes(&leptos_options, routes, {
            let opts = leptos_options.clone();
            move || client::app::shell(opts.clone())
        })
        .with_state(leptos_options.clone());

    let site_root_path = PathBuf::from(leptos_options.site_root.as_ref());

    // Compression covers the SSR pages and assets only; proxied traffic and
    // the websocket upgrade pass through as-is.
    let site = leptos_router
        .nest_service("/pkg", ServeDir::new(site_root_path.join("pkg")))
        .layer(CompressionLayer::new());

    Ok(api_routes(state).merge(site).layer(TraceLayer::new_for_http()))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
