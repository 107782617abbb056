//! Realtime channel adapter: inbound events in, control events out.
//!
//! SYSTEM CONTEXT
//! ==============
//! The transport hands decoded [`InboundEvent`]s and [`TransportNotice`]s to
//! a [`ChannelAdapter`], which maps each one onto [`SessionState`] mutations.
//! User actions (pause, resume, stop) go through the adapter too, which
//! decides whether an [`OutboundEvent`] should be sent and records the
//! matching status message.
//!
//! DESIGN
//! ======
//! The adapter itself is plain data and never touches the browser; the
//! `hydrate`-gated glue at the bottom of this file wires it to Leptos
//! signals, the outbound sender and `gloo_timers`.
//!
//! A stop request arms a [`SafetyTimer`]. The backend acknowledges with
//! `stream_stopped`; if that never arrives the timer expiry forces the same
//! terminal reset, so a stop always converges to an idle session.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use events::{FrameImage, InboundEvent, OutboundEvent};
use leptos::prelude::*;

use crate::state::session::{ConnectionStatus, SessionState};

/// Time the backend gets to acknowledge a stop before the UI resets anyway.
pub const STOP_TIMEOUT_MS: u64 = 5_000;
/// Frame counts that are a multiple of this produce a progress message.
pub const FRAME_MILESTONE_INTERVAL: u64 = 200;

/// Backend status line that echoes a stop request.
const STOP_ECHO_MESSAGE: &str = "Stopping video processing and streaming...";
/// Substring of the backend status line sent when processing finishes.
const PROCESSING_DONE_MARKER: &str = "Video processing complete";

/// Connection lifecycle notifications from the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportNotice {
    Connecting,
    Connected,
    Disconnected,
    Failed(String),
}

/// Identifies one arming of a [`SafetyTimer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken(u64);

/// One-shot timer handle. Each `arm` invalidates earlier tokens, so a stale
/// sleep that wakes up after a newer stop (or after an ack) does nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SafetyTimer {
    generation: u64,
    armed: Option<u64>,
}

impl SafetyTimer {
    pub fn arm(&mut self) -> TimerToken {
        self.generation += 1;
        self.armed = Some(self.generation);
        TimerToken(self.generation)
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    #[must_use]
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.armed == Some(token.0)
    }

    /// Consume the timer if `token` is the armed one.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.is_current(token) {
            self.armed = None;
            true
        } else {
            false
        }
    }
}

/// Event-to-state reducer for the realtime channel.
#[derive(Clone, Debug, Default)]
pub struct ChannelAdapter {
    stop_timer: SafetyTimer,
}

impl ChannelAdapter {
    /// True between a stop request and its acknowledgement or timeout.
    #[must_use]
    pub fn stop_pending(&self) -> bool {
        self.stop_timer.is_armed()
    }

    #[must_use]
    pub fn is_stop_token_current(&self, token: TimerToken) -> bool {
        self.stop_timer.is_current(token)
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    pub fn on_transport(&mut self, session: &mut SessionState, notice: TransportNotice) {
        match notice {
            TransportNotice::Connecting => session.set_connection(ConnectionStatus::Connecting),
            TransportNotice::Connected => {
                session.set_connection(ConnectionStatus::Connected);
                session.record_message("Connected to server");
            }
            TransportNotice::Disconnected => {
                self.stop_timer.disarm();
                session.deactivate_session();
                session.set_connection(ConnectionStatus::Disconnected);
                session.record_message("Disconnected from server");
            }
            TransportNotice::Failed(reason) => {
                session.set_connection(ConnectionStatus::Error);
                session.record_message(format!("Connection error: {reason}"));
            }
        }
    }

    pub fn on_event(&mut self, session: &mut SessionState, event: InboundEvent) {
        match event {
            InboundEvent::Message(text) => self.on_status_message(session, text),
            InboundEvent::Frame { image, count } => self.on_frame(session, &image, count),
            InboundEvent::Error(data) => {
                session.record_message(format!("Error: {data}"));
                session.clear_transitioning();
            }
            InboundEvent::Complete(data) => {
                session.record_message(format!("Stream ended: {data}"));
                session.complete_stream();
            }
            InboundEvent::ProcessingProgress { frames, progress } => {
                session.set_processing_progress(reported_percent(progress), frames);
                if frames > 0 && frames % FRAME_MILESTONE_INTERVAL == 0 {
                    session.record_message(format!("Processed {frames} frames so far..."));
                }
            }
            InboundEvent::ProcessingComplete { frames } => {
                session.complete_processing(frames);
                session.record_message(format!("Processing complete: {frames} total frames"));
            }
            InboundEvent::StreamPaused => session.set_paused(true),
            InboundEvent::StreamResumed => session.set_paused(false),
            InboundEvent::StreamStopped { reset } => {
                self.stop_timer.disarm();
                session.apply_terminal_reset();
                if reset {
                    session.record_message("Ready for a new video upload");
                }
            }
        }
    }

    fn on_status_message(&mut self, session: &mut SessionState, text: String) {
        if text == STOP_ECHO_MESSAGE {
            session.deactivate_session();
        } else if text.contains(PROCESSING_DONE_MARKER) {
            let frames = session.processing.frames_processed;
            session.complete_processing(frames);
        }
        session.record_message(text);
    }

    fn on_frame(&mut self, session: &mut SessionState, image: &str, count: Option<u64>) {
        if !session.is_connected() || self.stop_pending() {
            return;
        }
        match FrameImage::from_base64(image, count) {
            Ok(frame) => session.set_streaming_frame(frame),
            Err(e) => leptos::logging::warn!("dropping frame: {e}"),
        }
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Stop processing and streaming. Returns the event to send and the token
    /// of the armed safety timer.
    pub fn request_stop(&mut self, session: &mut SessionState) -> Option<(OutboundEvent, TimerToken)> {
        if !session.is_connected() {
            return None;
        }
        session.record_message(STOP_ECHO_MESSAGE);
        session.begin_stop();
        let token = self.stop_timer.arm();
        Some((OutboundEvent::StopStreaming, token))
    }

    /// Safety timer expiry. Forces the terminal reset when `token` is still
    /// armed; returns whether it was.
    pub fn expire_stop_timer(&mut self, session: &mut SessionState, token: TimerToken) -> bool {
        if !self.stop_timer.fire(token) {
            return false;
        }
        session.apply_terminal_reset();
        session.record_message("Stream stopped (timeout)");
        true
    }

    pub fn request_pause(&mut self, session: &mut SessionState) -> Option<OutboundEvent> {
        if !session.is_connected() || !session.streaming.active || session.streaming.paused {
            return None;
        }
        session.record_message("Pausing stream");
        Some(OutboundEvent::PauseStreaming)
    }

    pub fn request_resume(&mut self, session: &mut SessionState) -> Option<OutboundEvent> {
        if !session.is_connected() || !session.streaming.active || !session.streaming.paused {
            return None;
        }
        session.record_message("Resuming stream");
        Some(OutboundEvent::ResumeStreaming)
    }

    /// Pause when playing, resume when paused. The paused flag itself only
    /// changes on the backend's acknowledgement.
    pub fn request_toggle_pause(&mut self, session: &mut SessionState) -> Option<OutboundEvent> {
        if session.streaming.paused {
            self.request_resume(session)
        } else {
            self.request_pause(session)
        }
    }

    pub fn request_stop_processing(&mut self, session: &mut SessionState) -> Option<OutboundEvent> {
        if !session.is_connected() || !session.processing.active {
            return None;
        }
        session.record_message("Stopping video processing...");
        Some(OutboundEvent::StopProcessing)
    }
}

/// Backend percentage as a whole number. Zero and missing both mean "no
/// report", which lets the session fall back to its estimate.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn reported_percent(progress: Option<f64>) -> Option<u8> {
    progress
        .filter(|p| p.is_finite() && *p > 0.0)
        .map(|p| p.min(100.0).round() as u8)
}

// =============================================================================
// OUTBOUND SENDER
// =============================================================================

/// Handle to the transport's outbound queue. Empty until the transport is
/// spawned in the browser.
#[derive(Clone, Debug, Default)]
pub struct ChannelSender {
    #[cfg(feature = "hydrate")]
    tx: Option<futures::channel::mpsc::UnboundedSender<String>>,
}

impl ChannelSender {
    #[cfg(feature = "hydrate")]
    pub(crate) fn new(tx: futures::channel::mpsc::UnboundedSender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Queue an event for the socket. Returns `false` when nothing is
    /// connected to receive it.
    pub fn send(&self, event: OutboundEvent) -> bool {
        #[cfg(feature = "hydrate")]
        {
            self.tx
                .as_ref()
                .is_some_and(|tx| tx.unbounded_send(events::encode_outbound(event)).is_ok())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = event;
            false
        }
    }
}

// =============================================================================
// SIGNAL GLUE
// =============================================================================

/// Apply a transport notice to the shared session.
pub fn dispatch_notice(session: RwSignal<SessionState>, adapter: StoredValue<ChannelAdapter>, notice: TransportNotice) {
    session.update(|s| adapter.update_value(|a| a.on_transport(s, notice)));
}

/// Apply an inbound event to the shared session.
pub fn dispatch_event(session: RwSignal<SessionState>, adapter: StoredValue<ChannelAdapter>, event: InboundEvent) {
    session.update(|s| adapter.update_value(|a| a.on_event(s, event)));
}

/// User pressed Stop.
pub fn request_stop(
    session: RwSignal<SessionState>,
    adapter: StoredValue<ChannelAdapter>,
    sender: StoredValue<ChannelSender>,
) {
    let mut request = None;
    session.update(|s| adapter.update_value(|a| request = a.request_stop(s)));
    let Some((event, token)) = request else {
        return;
    };
    sender.with_value(|tx| tx.send(event));
    schedule_stop_timeout(session, adapter, token);
}

/// User pressed Pause/Continue.
pub fn request_toggle_pause(
    session: RwSignal<SessionState>,
    adapter: StoredValue<ChannelAdapter>,
    sender: StoredValue<ChannelSender>,
) {
    let mut request = None;
    session.update(|s| adapter.update_value(|a| request = a.request_toggle_pause(s)));
    if let Some(event) = request {
        sender.with_value(|tx| tx.send(event));
    }
}

fn schedule_stop_timeout(session: RwSignal<SessionState>, adapter: StoredValue<ChannelAdapter>, token: TimerToken) {
    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        gloo_timers::future::sleep(std::time::Duration::from_millis(STOP_TIMEOUT_MS)).await;
        if !adapter.with_value(|a| a.is_stop_token_current(token)) {
            return;
        }
        session.update(|s| {
            adapter.update_value(|a| {
                a.expire_stop_timer(s, token);
            });
        });
        leptos::logging::warn!("stop not acknowledged within {STOP_TIMEOUT_MS} ms; session reset");
    });
    #[cfg(not(feature = "hydrate"))]
    let _ = (session, adapter, token);
}
