use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::time::timeout;

use super::*;
use crate::config::HostConfig;

// =============================================================================
// CONVERSION
// =============================================================================

#[test]
fn client_text_and_binary_are_forwarded() {
    let text = client_to_backend(Message::Text(r#"{"event":"stop_streaming"}"#.into()));
    assert_eq!(text, Relay::Forward(BackendMessage::Text(r#"{"event":"stop_streaming"}"#.into())));

    let bin = client_to_backend(Message::Binary(vec![1_u8, 2, 3].into()));
    assert_eq!(bin, Relay::Forward(BackendMessage::Binary(vec![1_u8, 2, 3].into())));
}

#[test]
fn client_close_ends_bridge_and_pings_stay_local() {
    assert_eq!(client_to_backend(Message::Close(None)), Relay::Close);
    assert_eq!(client_to_backend(Message::Ping(vec![9_u8].into())), Relay::Skip);
    assert_eq!(client_to_backend(Message::Pong(vec![9_u8].into())), Relay::Skip);
}

#[test]
fn backend_text_is_forwarded_and_close_ends_bridge() {
    let out = backend_to_client(BackendMessage::Text(r#"{"event":"message","data":{"data":"hi"}}"#.into()));
    assert_eq!(out, Relay::Forward(Message::Text(r#"{"event":"message","data":{"data":"hi"}}"#.into())));
    assert_eq!(backend_to_client(BackendMessage::Close(None)), Relay::Close);
    assert_eq!(backend_to_client(BackendMessage::Ping(vec![1_u8].into())), Relay::Skip);
}

// =============================================================================
// END TO END
// =============================================================================

async fn serve(router: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn serve_host(backend_ws_url: String) -> std::net::SocketAddr {
    let config = HostConfig {
        port: 0,
        backend_url: "http://127.0.0.1:9".to_owned(),
        backend_ws_url,
        proxy_timeout: Duration::from_secs(5),
    };
    serve(crate::routes::api_routes(AppState::new(config).unwrap())).await
}

/// Backend that answers every text message with a `message` event echoing it.
async fn echo_backend(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|mut socket| async move {
        while let Some(Ok(msg)) = socket.recv().await {
            match msg {
                Message::Text(text) => {
                    let reply = serde_json::json!({ "event": "message", "data": { "data": text.as_str() } });
                    if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    })
}

async fn next_text<S>(stream: &mut S) -> String
where
    S: futures::Stream<Item = Result<BackendMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("receive timed out")
            .expect("stream ended")
            .expect("receive failed");
        if let BackendMessage::Text(text) = msg {
            return text.as_str().to_owned();
        }
    }
}

#[tokio::test]
async fn messages_are_relayed_both_ways() {
    let backend = serve(Router::new().route("/ws", get(echo_backend))).await;
    let host = serve_host(format!("ws://{backend}/ws")).await;

    let (mut stream, _) = connect_async(format!("ws://{host}/ws")).await.unwrap();
    stream
        .send(BackendMessage::Text(r#"{"event":"pause_streaming","data":{}}"#.into()))
        .await
        .unwrap();

    let reply = next_text(&mut stream).await;
    let event = events::decode_inbound(&reply).unwrap();
    assert_eq!(event, events::InboundEvent::Message(r#"{"event":"pause_streaming","data":{}}"#.to_owned()));
}

#[tokio::test]
async fn unreachable_backend_fails_the_handshake() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);
    let host = serve_host(format!("ws://{dead}/ws")).await;

    // No upgrade happens, so the browser's connect attempt fails and counts
    // against its reconnect budget.
    let Err(err) = connect_async(format!("ws://{host}/ws")).await else {
        panic!("handshake should fail while the backend is down");
    };
    assert!(err.to_string().contains("502"), "unexpected error: {err}");
}

#[tokio::test]
async fn backend_close_closes_the_client() {
    let backend = serve(Router::new().route(
        "/ws",
        get(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket| async move {
                let _ = socket.send(Message::Close(None)).await;
            })
        }),
    ))
    .await;
    let host = serve_host(format!("ws://{backend}/ws")).await;

    let (mut stream, _) = connect_async(format!("ws://{host}/ws")).await.unwrap();
    let closed = timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(Ok(BackendMessage::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => {}
            }
        }
    })
    .await
    .expect("close timed out");
    assert!(closed);
}
