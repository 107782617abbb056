//! Server-provided client configuration (`GET /api/config`).
//!
//! DESIGN
//! ======
//! Every section and key is optional on the wire; missing or zero values fall
//! back to the defaults below so a partial config never disables a feature by
//! accident. The snapshot is immutable once applied to the session.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 500;
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u32 = 300_000;
pub const DEFAULT_PROGRESS_NOTIFICATION_INTERVAL: u8 = 25;
pub const DEFAULT_RECONNECTION_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECTION_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RECONNECTION_DELAY_MAX_MS: u64 = 5_000;
pub const DEFAULT_MAX_MESSAGES: usize = 100;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Full configuration snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub upload: UploadConfig,
    pub websocket: ChannelConfig,
    pub ui: UiConfig,
}

impl ClientConfig {
    /// Replace zero values with defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.upload.max_file_size_mb == 0 {
            self.upload.max_file_size_mb = DEFAULT_MAX_FILE_SIZE_MB;
        }
        if self.upload.timeout_ms == 0 {
            self.upload.timeout_ms = DEFAULT_UPLOAD_TIMEOUT_MS;
        }
        if self.upload.progress_notification_interval == 0 {
            self.upload.progress_notification_interval = DEFAULT_PROGRESS_NOTIFICATION_INTERVAL;
        }
        self.upload.progress_notification_interval = self.upload.progress_notification_interval.min(100);
        if self.websocket.reconnection_delay == 0 {
            self.websocket.reconnection_delay = DEFAULT_RECONNECTION_DELAY_MS;
        }
        if self.websocket.reconnection_delay_max < self.websocket.reconnection_delay {
            self.websocket.reconnection_delay_max = self.websocket.reconnection_delay;
        }
        if self.ui.max_messages == 0 {
            self.ui.max_messages = DEFAULT_MAX_MESSAGES;
        }
        self
    }
}

/// Upload limits and progress reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_size_mb: u64,
    pub timeout_ms: u32,
    /// Percentage step between user-visible progress messages.
    pub progress_notification_interval: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
            progress_notification_interval: DEFAULT_PROGRESS_NOTIFICATION_INTERVAL,
        }
    }
}

impl UploadConfig {
    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

/// Realtime channel reconnection policy. Delays are milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub reconnection: bool,
    pub reconnection_attempts: u32,
    pub reconnection_delay: u64,
    pub reconnection_delay_max: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnection: true,
            reconnection_attempts: DEFAULT_RECONNECTION_ATTEMPTS,
            reconnection_delay: DEFAULT_RECONNECTION_DELAY_MS,
            reconnection_delay_max: DEFAULT_RECONNECTION_DELAY_MAX_MS,
        }
    }
}

/// Presentation limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Message log capacity.
    pub max_messages: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { max_messages: DEFAULT_MAX_MESSAGES }
    }
}

/// Whole mebibytes, rounded to nearest, as shown in upload messages.
#[must_use]
pub fn rounded_mb(bytes: u64) -> u64 {
    bytes.saturating_add(BYTES_PER_MB / 2) / BYTES_PER_MB
}
