use super::*;
use serde_json::json;

fn envelope_text(event: &str, data: serde_json::Value) -> String {
    json!({ "event": event, "data": data }).to_string()
}

// =============================================================
// Envelope
// =============================================================

#[test]
fn decode_envelope_defaults_missing_data_to_null() {
    let env = decode_envelope(r#"{"event":"stream_paused"}"#).expect("envelope");
    assert_eq!(env.event, "stream_paused");
    assert!(env.data.is_null());
}

#[test]
fn decode_envelope_rejects_non_json() {
    assert!(matches!(decode_envelope("42[\"frame\"]"), Err(CodecError::Envelope(_))));
}

// =============================================================
// Inbound
// =============================================================

#[test]
fn message_event_reads_data_field() {
    let ev = decode_inbound(&envelope_text("message", json!({"data": "Connected to server"}))).expect("event");
    assert_eq!(ev, InboundEvent::Message("Connected to server".to_owned()));
    assert_eq!(ev.name(), "message");
}

#[test]
fn error_event_renders_non_string_data_as_json() {
    let ev = decode_inbound(&envelope_text("error", json!({"data": {"code": 7}}))).expect("event");
    assert_eq!(ev, InboundEvent::Error(r#"{"code":7}"#.to_owned()));
}

#[test]
fn complete_event_accepts_bare_string_payload() {
    let ev = decode_inbound(&envelope_text("complete", json!("Finished"))).expect("event");
    assert_eq!(ev, InboundEvent::Complete("Finished".to_owned()));
}

#[test]
fn frame_event_carries_image_and_count() {
    let ev = decode_inbound(&envelope_text("frame", json!({"frame": "/9j/4AAQ", "count": 12}))).expect("event");
    assert_eq!(ev, InboundEvent::Frame { image: "/9j/4AAQ".to_owned(), count: Some(12) });
}

#[test]
fn frame_event_without_image_is_payload_error() {
    let err = decode_inbound(&envelope_text("frame", json!({"count": 1}))).unwrap_err();
    assert!(matches!(err, CodecError::Payload { ref event, .. } if event == "frame"));
}

#[test]
fn processing_progress_percentage_is_optional() {
    let ev = decode_inbound(&envelope_text(
        "processing_progress",
        json!({"frames": 40, "status": "processing", "progress": 1}),
    ))
    .expect("event");
    assert_eq!(ev, InboundEvent::ProcessingProgress { frames: 40, progress: Some(1.0) });

    let ev = decode_inbound(&envelope_text("processing_progress", json!({"frames": 10}))).expect("event");
    assert_eq!(ev, InboundEvent::ProcessingProgress { frames: 10, progress: None });
}

#[test]
fn processing_complete_defaults_frames_to_zero() {
    let ev = decode_inbound(&envelope_text("processing_complete", json!({}))).expect("event");
    assert_eq!(ev, InboundEvent::ProcessingComplete { frames: 0 });
}

#[test]
fn acknowledgements_accept_null_payloads() {
    assert_eq!(decode_inbound(r#"{"event":"stream_paused","data":null}"#).expect("event"), InboundEvent::StreamPaused);
    assert_eq!(decode_inbound(r#"{"event":"stream_resumed"}"#).expect("event"), InboundEvent::StreamResumed);
    assert_eq!(
        decode_inbound(r#"{"event":"stream_stopped"}"#).expect("event"),
        InboundEvent::StreamStopped { reset: false }
    );
    assert_eq!(
        decode_inbound(&envelope_text("stream_stopped", json!({"reset": true}))).expect("event"),
        InboundEvent::StreamStopped { reset: true }
    );
}

#[test]
fn unknown_event_is_reported_by_name() {
    let err = decode_inbound(&envelope_text("session:connected", json!({}))).unwrap_err();
    assert!(matches!(err, CodecError::UnknownEvent(ref name) if name == "session:connected"));
}

// =============================================================
// Outbound
// =============================================================

#[test]
fn outbound_names_match_backend_handlers() {
    assert_eq!(OutboundEvent::StopStreaming.name(), "stop_streaming");
    assert_eq!(OutboundEvent::StopProcessing.name(), "stop_processing");
    assert_eq!(OutboundEvent::PauseStreaming.name(), "pause_streaming");
    assert_eq!(OutboundEvent::ResumeStreaming.name(), "resume_streaming");
}

#[test]
fn encode_outbound_produces_envelope_with_empty_payload() {
    let text = encode_outbound(OutboundEvent::PauseStreaming);
    let env = decode_envelope(&text).expect("envelope");
    assert_eq!(env.event, "pause_streaming");
    assert_eq!(env.data, json!({}));
    assert_eq!(OutboundEvent::from_name(&env.event), Some(OutboundEvent::PauseStreaming));
}

#[test]
fn from_name_rejects_inbound_names() {
    assert_eq!(OutboundEvent::from_name("frame"), None);
}

// =============================================================
// Frame images
// =============================================================

#[test]
fn jpeg_header_is_detected() {
    // FF D8 FF E0 00 10 4A 46 49 46 00 01
    let img = FrameImage::from_base64("/9j/4AAQSkZJRgABAQAAAQABAAD", Some(3)).expect("image");
    assert_eq!(img.format(), ImageFormat::Jpeg);
    assert_eq!(img.count, Some(3));
    assert!(img.data_url().starts_with("data:image/jpeg;base64,/9j/4AAQ"));
}

#[test]
fn png_header_is_detected() {
    // 89 50 4E 47 0D 0A 1A 0A
    let img = FrameImage::from_base64("iVBORw0KGgoAAAANSUhEUg", None).expect("image");
    assert_eq!(img.format(), ImageFormat::Png);
    assert!(img.data_url().starts_with("data:image/png;base64,"));
}

#[test]
fn short_padded_image_decodes() {
    let img = FrameImage::from_base64("R0lGODg=", None).expect("image");
    assert_eq!(img.format(), ImageFormat::Gif);
}

#[test]
fn empty_image_is_rejected() {
    assert!(matches!(FrameImage::from_base64("  ", None), Err(CodecError::EmptyImage)));
}

#[test]
fn invalid_base64_is_rejected() {
    assert!(matches!(FrameImage::from_base64("!!!!not-base64!!", None), Err(CodecError::Image(_))));
}

#[test]
fn unknown_magic_defaults_to_jpeg() {
    assert_eq!(ImageFormat::sniff(&[0, 1, 2, 3]), ImageFormat::Jpeg);
    assert_eq!(ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "), ImageFormat::Webp);
}
