//! Session state for one page lifetime: connection, upload, processing,
//! streaming and the message log.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionState` is provided as `RwSignal<SessionState>` from the app root.
//! The channel adapter, the upload submitter and user actions mutate it only
//! through the methods below; components read it.
//!
//! INVARIANTS
//! ==========
//! - A frame is only retained while streaming or processing is active, or
//!   while a stop request is in flight (`streaming.transitioning`).
//! - The message log never exceeds its cap; the oldest entries go first.
//! - Upload and processing percentages never decrease within a session and
//!   never exceed 100. Only `begin_*` and the terminal reset zero them.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::VecDeque;

use events::FrameImage;

use crate::state::config::{ClientConfig, DEFAULT_MAX_MESSAGES};

/// Points the processing estimate advances when the backend omits a percentage.
pub const PROCESSING_FALLBACK_STEP: u8 = 5;
/// Ceiling for the processing estimate; only a real report reaches 100.
pub const PROCESSING_FALLBACK_CAP: u8 = 95;

/// Realtime channel connection status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection held.
    #[default]
    Disconnected,
    /// Socket handshake in progress.
    Connecting,
    /// Socket open.
    Connected,
    /// Last connection attempt failed.
    Error,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadStatus {
    pub active: bool,
    pub progress_percent: u8,
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessingStatus {
    pub active: bool,
    pub progress_percent: u8,
    pub frames_processed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingStatus {
    pub active: bool,
    pub paused: bool,
    /// A start or stop has been requested and not yet confirmed.
    pub transitioning: bool,
    pub current_frame: Option<FrameImage>,
}

/// Bounded FIFO of user-visible status lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLog {
    entries: VecDeque<String>,
    cap: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_cap(DEFAULT_MAX_MESSAGES)
    }
}

impl MessageLog {
    /// Empty log holding at most `cap` entries (minimum 1).
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { entries: VecDeque::with_capacity(cap.min(DEFAULT_MAX_MESSAGES)), cap }
    }

    /// Append a message, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, message: String) {
        self.entries.push_back(message);
        self.trim();
    }

    /// Change the cap; shrinking drops the oldest entries immediately.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Messages oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Client view of the upload/processing/streaming session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub connection: ConnectionStatus,
    pub upload: UploadStatus,
    pub processing: ProcessingStatus,
    pub streaming: StreamingStatus,
    pub messages: MessageLog,
    /// Server configuration; `None` until loaded, which disables upload and connect.
    pub config: Option<ClientConfig>,
}

impl SessionState {
    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }

    /// True while anything the user started is still in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.upload.active || self.processing.active || self.streaming.active || self.streaming.transitioning
    }

    /// Whether the upload trigger should be enabled.
    #[must_use]
    pub fn can_upload(&self) -> bool {
        self.config.is_some() && self.is_connected() && !self.is_busy()
    }

    // -------------------------------------------------------------------------
    // Configuration and connection
    // -------------------------------------------------------------------------

    /// Install the server configuration and resize the message log.
    pub fn apply_config(&mut self, config: ClientConfig) {
        let config = config.sanitized();
        self.messages.set_cap(config.ui.max_messages);
        self.config = Some(config);
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    // -------------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------------

    pub fn record_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    // -------------------------------------------------------------------------
    // Upload
    // -------------------------------------------------------------------------

    /// Start a new upload session at 0%.
    pub fn begin_upload(&mut self) {
        self.upload = UploadStatus { active: true, progress_percent: 0, last_error: None };
    }

    /// Record upload progress. Ignored when no upload is active; never
    /// decreases and never exceeds 100.
    pub fn set_upload_progress(&mut self, percent: u8) {
        if !self.upload.active {
            return;
        }
        self.upload.progress_percent = self.upload.progress_percent.max(percent.min(100));
    }

    /// Upload finished or was canceled.
    pub fn end_upload(&mut self) {
        self.upload.active = false;
    }

    pub fn fail_upload(&mut self, reason: impl Into<String>) {
        self.upload.active = false;
        self.upload.last_error = Some(reason.into());
    }

    // -------------------------------------------------------------------------
    // Processing
    // -------------------------------------------------------------------------

    /// The backend accepted an upload: processing starts and the stream is
    /// expected shortly.
    pub fn begin_processing(&mut self) {
        self.processing = ProcessingStatus { active: true, progress_percent: 0, frames_processed: 0 };
        self.streaming = StreamingStatus { transitioning: true, ..StreamingStatus::default() };
    }

    /// Apply a processing report. A real percentage wins; without one the
    /// estimate advances by [`PROCESSING_FALLBACK_STEP`] up to
    /// [`PROCESSING_FALLBACK_CAP`]. Ignored once processing is inactive.
    pub fn set_processing_progress(&mut self, percent: Option<u8>, frames: u64) {
        if !self.processing.active {
            return;
        }
        let current = self.processing.progress_percent;
        let next = match percent {
            Some(p) => p.min(100),
            None => current.saturating_add(PROCESSING_FALLBACK_STEP).min(PROCESSING_FALLBACK_CAP),
        };
        self.processing.progress_percent = current.max(next);
        self.processing.frames_processed = self.processing.frames_processed.max(frames);
    }

    pub fn complete_processing(&mut self, frames: u64) {
        self.processing.active = false;
        self.processing.progress_percent = 100;
        self.processing.frames_processed = self.processing.frames_processed.max(frames);
        self.release_idle_frame();
    }

    // -------------------------------------------------------------------------
    // Streaming
    // -------------------------------------------------------------------------

    /// Show a new frame; the stream is live from here on.
    pub fn set_streaming_frame(&mut self, frame: FrameImage) {
        self.streaming.current_frame = Some(frame);
        self.streaming.active = true;
        self.streaming.transitioning = false;
    }

    /// The backend finished sending frames.
    pub fn complete_stream(&mut self) {
        self.streaming.active = false;
        self.streaming.paused = false;
        self.streaming.transitioning = false;
        self.release_idle_frame();
    }

    /// Pause/resume acknowledgement. Pausing only applies to a live stream.
    pub fn set_paused(&mut self, paused: bool) {
        self.streaming.paused = paused && self.streaming.active;
    }

    pub fn clear_transitioning(&mut self) {
        self.streaming.transitioning = false;
        self.release_idle_frame();
    }

    /// Optimistic local stop: everything goes inactive at once while the
    /// frame stays on screen until the backend (or the safety timer) confirms.
    pub fn begin_stop(&mut self) {
        self.streaming.active = false;
        self.streaming.paused = false;
        self.streaming.transitioning = true;
        self.processing.active = false;
    }

    /// Full reset after a stop: frame cleared, progress zeroed.
    pub fn apply_terminal_reset(&mut self) {
        self.streaming = StreamingStatus::default();
        self.processing = ProcessingStatus::default();
    }

    /// Transport lost: force every session flag off.
    pub fn deactivate_session(&mut self) {
        self.streaming.active = false;
        self.streaming.paused = false;
        self.streaming.transitioning = false;
        self.streaming.current_frame = None;
        self.processing.active = false;
    }

    fn release_idle_frame(&mut self) {
        if !self.streaming.active && !self.processing.active && !self.streaming.transitioning {
            self.streaming.current_frame = None;
        }
    }
}
