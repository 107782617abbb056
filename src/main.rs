#![recursion_limit = "256"]

mod config;
mod routes;
mod state;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::HostConfig::from_env().expect("invalid host configuration");
    let port = config.port;
    tracing::info!(backend = %config.backend_url, backend_ws = %config.backend_ws_url, "proxy targets");

    let state = state::AppState::new(config).expect("http client init failed");
    let app = routes::app(state).expect("router init failed");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "motionstream listening");
    axum::serve(listener, app).await.expect("server failed");
}
