use super::*;
use serde_json::json;

// =============================================================
// Defaults
// =============================================================

#[test]
fn empty_object_uses_defaults() {
    let cfg: ClientConfig = serde_json::from_value(json!({})).expect("config");
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.upload.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);
    assert_eq!(cfg.upload.timeout_ms, DEFAULT_UPLOAD_TIMEOUT_MS);
    assert_eq!(cfg.upload.progress_notification_interval, DEFAULT_PROGRESS_NOTIFICATION_INTERVAL);
    assert!(cfg.websocket.reconnection);
    assert_eq!(cfg.websocket.reconnection_attempts, DEFAULT_RECONNECTION_ATTEMPTS);
    assert_eq!(cfg.ui.max_messages, DEFAULT_MAX_MESSAGES);
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let cfg: ClientConfig = serde_json::from_value(json!({
        "upload": {"max_file_size_mb": 50},
        "ui": {"max_messages": 10}
    }))
    .expect("config");
    assert_eq!(cfg.upload.max_file_size_mb, 50);
    assert_eq!(cfg.upload.timeout_ms, DEFAULT_UPLOAD_TIMEOUT_MS);
    assert_eq!(cfg.ui.max_messages, 10);
    assert_eq!(cfg.websocket, ChannelConfig::default());
}

#[test]
fn unknown_keys_are_ignored() {
    let cfg: ClientConfig = serde_json::from_value(json!({
        "websocket": {"transports": ["websocket", "polling"], "reconnection_attempts": 9}
    }))
    .expect("config");
    assert_eq!(cfg.websocket.reconnection_attempts, 9);
}

// =============================================================
// Sanitizing
// =============================================================

#[test]
fn sanitized_replaces_zero_values() {
    let cfg = ClientConfig {
        upload: UploadConfig { max_file_size_mb: 0, timeout_ms: 0, progress_notification_interval: 0 },
        websocket: ChannelConfig {
            reconnection: true,
            reconnection_attempts: 0,
            reconnection_delay: 0,
            reconnection_delay_max: 0,
        },
        ui: UiConfig { max_messages: 0 },
    }
    .sanitized();
    assert_eq!(cfg.upload.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);
    assert_eq!(cfg.upload.timeout_ms, DEFAULT_UPLOAD_TIMEOUT_MS);
    assert_eq!(cfg.upload.progress_notification_interval, DEFAULT_PROGRESS_NOTIFICATION_INTERVAL);
    assert_eq!(cfg.websocket.reconnection_delay, DEFAULT_RECONNECTION_DELAY_MS);
    assert_eq!(cfg.websocket.reconnection_delay_max, DEFAULT_RECONNECTION_DELAY_MS);
    assert_eq!(cfg.websocket.reconnection_attempts, 0);
    assert_eq!(cfg.ui.max_messages, DEFAULT_MAX_MESSAGES);
}

#[test]
fn sanitized_clamps_notification_interval() {
    let mut cfg = ClientConfig::default();
    cfg.upload.progress_notification_interval = 250;
    assert_eq!(cfg.sanitized().upload.progress_notification_interval, 100);
}

// =============================================================
// Size helpers
// =============================================================

#[test]
fn max_file_size_bytes_uses_mebibytes() {
    let cfg = UploadConfig { max_file_size_mb: 500, ..UploadConfig::default() };
    assert_eq!(cfg.max_file_size_bytes(), 500 * 1024 * 1024);
}

#[test]
fn rounded_mb_rounds_to_nearest() {
    assert_eq!(rounded_mb(0), 0);
    assert_eq!(rounded_mb(600 * 1024 * 1024), 600);
    assert_eq!(rounded_mb(1024 * 1024 + 512 * 1024), 2);
    assert_eq!(rounded_mb(1024 * 1024 + 511 * 1024), 1);
}
