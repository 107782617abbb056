//! Websocket transport for the realtime channel.
//!
//! The transport owns the page's single socket to `/ws`, reconnects according
//! to the server-provided [`ChannelConfig`], and feeds everything it hears to
//! the channel adapter through the dispatch helpers in [`super::channel`].
//!
//! All socket code is gated behind `#[cfg(feature = "hydrate")]`; the
//! reconnect policy and URL helpers are plain functions so they can be tested
//! natively.
//!
//! ERROR HANDLING
//! ==============
//! Handshake failures become `TransportNotice::Failed`, dropped sockets become
//! `TransportNotice::Disconnected`, and undecodable messages are logged and
//! skipped. The loop ends only when the reconnect policy is exhausted.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use leptos::prelude::*;

use super::channel::{ChannelAdapter, ChannelSender};
use crate::state::config::ChannelConfig;
use crate::state::session::SessionState;

/// Path of the realtime endpoint on the page host.
pub const CHANNEL_PATH: &str = "/ws";

/// Reconnect schedule derived from [`ChannelConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay: Duration,
    pub delay_max: Duration,
}

impl From<&ChannelConfig> for ReconnectPolicy {
    fn from(config: &ChannelConfig) -> Self {
        let delay = Duration::from_millis(config.reconnection_delay);
        Self {
            enabled: config.reconnection,
            max_attempts: config.reconnection_attempts,
            delay,
            delay_max: Duration::from_millis(config.reconnection_delay_max).max(delay),
        }
    }
}

impl ReconnectPolicy {
    /// Wait before reconnect attempt number `attempt` (1-based). The delay
    /// doubles per attempt up to `delay_max`; `None` means give up.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled || attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1_u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.delay.saturating_mul(factor).min(self.delay_max))
    }
}

/// Websocket URL for a page served with `protocol` (e.g. `"https:"`) from
/// `host` (e.g. `"example.com:3000"`).
#[must_use]
pub fn channel_url(protocol: &str, host: &str) -> String {
    let scheme = if protocol.starts_with("https") { "wss" } else { "ws" };
    format!("{scheme}://{host}{CHANNEL_PATH}")
}

/// Drop outbound messages still queued when a socket session ends, so they
/// never reach the next backend session. Returns how many were dropped.
#[cfg(any(test, feature = "hydrate"))]
fn discard_stale(mut next: impl FnMut() -> Option<String>) -> usize {
    let mut dropped = 0;
    while next().is_some() {
        dropped += 1;
    }
    dropped
}

/// Start the transport task and return the outbound sender.
///
/// Outside the browser this returns an empty sender and spawns nothing.
pub fn spawn_channel(
    session: RwSignal<SessionState>,
    adapter: StoredValue<ChannelAdapter>,
    config: &ChannelConfig,
) -> ChannelSender {
    let policy = ReconnectPolicy::from(config);
    #[cfg(feature = "hydrate")]
    {
        let (tx, rx) = futures::channel::mpsc::unbounded::<String>();
        leptos::task::spawn_local(channel_loop(session, adapter, policy, rx));
        ChannelSender::new(tx)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (session, adapter, policy);
        ChannelSender::default()
    }
}

#[cfg(feature = "hydrate")]
fn page_channel_url() -> String {
    let location = web_sys::window().map(|w| w.location());
    let protocol = location
        .as_ref()
        .and_then(|l| l.protocol().ok())
        .unwrap_or_else(|| "http:".to_owned());
    let host = location
        .as_ref()
        .and_then(|l| l.host().ok())
        .unwrap_or_else(|| "localhost:3000".to_owned());
    channel_url(&protocol, &host)
}

/// Connection loop with policy-driven reconnects.
#[cfg(feature = "hydrate")]
async fn channel_loop(
    session: RwSignal<SessionState>,
    adapter: StoredValue<ChannelAdapter>,
    policy: ReconnectPolicy,
    rx: futures::channel::mpsc::UnboundedReceiver<String>,
) {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::channel::{TransportNotice, dispatch_notice};

    let rx = Rc::new(RefCell::new(rx));
    let url = page_channel_url();
    let mut attempt: u32 = 0;

    loop {
        dispatch_notice(session, adapter, TransportNotice::Connecting);

        match connect_and_run(&url, session, adapter, &rx).await {
            Ok(()) => {
                leptos::logging::log!("channel closed");
                attempt = 0;
                dispatch_notice(session, adapter, TransportNotice::Disconnected);
            }
            Err(e) => {
                leptos::logging::warn!("channel connect failed: {e}");
                dispatch_notice(session, adapter, TransportNotice::Failed(e));
            }
        }

        let dropped = discard_stale(|| rx.borrow_mut().try_next().ok().flatten());
        if dropped > 0 {
            leptos::logging::warn!("channel dropped {dropped} unsent messages");
        }

        attempt += 1;
        let Some(delay) = policy.delay_for(attempt) else {
            leptos::logging::warn!("channel reconnect gave up after {} attempts", attempt - 1);
            return;
        };
        gloo_timers::future::sleep(delay).await;
    }
}

/// Poll interval while waiting for the handshake to settle.
#[cfg(feature = "hydrate")]
const HANDSHAKE_POLL: Duration = Duration::from_millis(50);

/// Open one socket and pump messages until it closes.
///
/// Returns `Err` only when the socket never opened.
#[cfg(feature = "hydrate")]
async fn connect_and_run(
    url: &str,
    session: RwSignal<SessionState>,
    adapter: StoredValue<ChannelAdapter>,
    rx: &std::rc::Rc<std::cell::RefCell<futures::channel::mpsc::UnboundedReceiver<String>>>,
) -> Result<(), String> {
    use futures::StreamExt;
    use gloo_net::websocket::futures::WebSocket;
    use gloo_net::websocket::{Message, State};

    use super::channel::{TransportNotice, dispatch_event, dispatch_notice};

    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    loop {
        match ws.state() {
            State::Open => break,
            State::Connecting => gloo_timers::future::sleep(HANDSHAKE_POLL).await,
            State::Closing | State::Closed => return Err(format!("{url} refused the connection")),
        }
    }
    dispatch_notice(session, adapter, TransportNotice::Connected);

    let (mut ws_write, mut ws_read) = ws.split();

    let mut rx_borrow = rx.borrow_mut();
    let send_task = async {
        use futures::SinkExt;
        while let Some(text) = rx_borrow.next().await {
            if ws_write.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    };

    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Text(text)) => match events::decode_inbound(&text) {
                    Ok(event) => dispatch_event(session, adapter, event),
                    Err(e) => leptos::logging::warn!("channel: {e}"),
                },
                Ok(Message::Bytes(_)) => {}
                Err(e) => {
                    leptos::logging::warn!("channel recv error: {e}");
                    break;
                }
            }
        }
    };

    futures::future::select(Box::pin(send_task), Box::pin(recv_task)).await;
    Ok(())
}
