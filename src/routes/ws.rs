//! WebSocket bridge between the browser and the backend channel.
//!
//! DESIGN
//! ======
//! Each browser upgrade is backed by its own backend connection to
//! `BACKEND_WS_URL`, then both directions are pumped in one `select!` loop.
//! Text and binary messages pass through untouched; pings and pongs stay
//! local to each leg. A close from either side ends the bridge and closes
//! the other leg.
//!
//! LIFECYCLE
//! =========
//! 1. Dial the backend
//! 2. Backend unreachable → `502 Bad Gateway`, no upgrade (the browser sees a
//!    failed handshake and its reconnect budget is spent)
//! 3. Upgrade → relay until either side closes or errors

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as BackendMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// What the relay should do with one received message.
#[derive(Debug, PartialEq)]
pub(crate) enum Relay<T> {
    Forward(T),
    Skip,
    Close,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let url = state.config.backend_ws_url.as_str();
    match connect_async(url).await {
        Ok((backend, _)) => {
            info!(%url, "ws: client bridged");
            ws.on_upgrade(move |socket| run_bridge(socket, backend))
        }
        Err(e) => {
            warn!(error = %e, %url, "ws: backend unavailable");
            (StatusCode::BAD_GATEWAY, "backend unavailable").into_response()
        }
    }
}

// =============================================================================
// BRIDGE
// =============================================================================

type BackendStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn run_bridge(mut client: WebSocket, backend: BackendStream) {
    let (mut backend_tx, mut backend_rx) = backend.split();

    loop {
        tokio::select! {
            msg = client.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match client_to_backend(msg) {
                    Relay::Forward(out) => {
                        if let BackendMessage::Text(text) = &out {
                            log_event("client", text.as_str());
                        }
                        if let Err(e) = backend_tx.send(out).await {
                            warn!(error = %e, "ws: backend send failed");
                            break;
                        }
                    }
                    Relay::Skip => {}
                    Relay::Close => break,
                }
            }
            msg = backend_rx.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!(error = %e, "ws: backend read failed");
                        break;
                    }
                    None => break,
                };
                match backend_to_client(msg) {
                    Relay::Forward(out) => {
                        if let Message::Text(text) = &out {
                            log_event("backend", text.as_str());
                        }
                        if client.send(out).await.is_err() {
                            break;
                        }
                    }
                    Relay::Skip => {}
                    Relay::Close => break,
                }
            }
        }
    }

    let _ = backend_tx.close().await;
    let _ = client.send(Message::Close(None)).await;
    info!("ws: client disconnected");
}

// =============================================================================
// CONVERSION
// =============================================================================

pub(crate) fn client_to_backend(msg: Message) -> Relay<BackendMessage> {
    match msg {
        Message::Text(text) => Relay::Forward(BackendMessage::Text(text.as_str().to_owned().into())),
        Message::Binary(bytes) => Relay::Forward(BackendMessage::Binary(bytes)),
        Message::Ping(_) | Message::Pong(_) => Relay::Skip,
        Message::Close(_) => Relay::Close,
    }
}

pub(crate) fn backend_to_client(msg: BackendMessage) -> Relay<Message> {
    match msg {
        BackendMessage::Text(text) => Relay::Forward(Message::Text(text.as_str().to_owned().into())),
        BackendMessage::Binary(bytes) => Relay::Forward(Message::Binary(bytes)),
        BackendMessage::Ping(_) | BackendMessage::Pong(_) | BackendMessage::Frame(_) => Relay::Skip,
        BackendMessage::Close(_) => Relay::Close,
    }
}

fn log_event(from: &str, text: &str) {
    match events::decode_envelope(text) {
        // Frames are high volume; keep them out of debug.
        Ok(envelope) if envelope.event == "frame" => {}
        Ok(envelope) => debug!(from, event = %envelope.event, "ws: relay"),
        Err(e) => debug!(from, error = %e, "ws: relay non-envelope text"),
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
