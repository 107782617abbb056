//! Named-event model and JSON codec for the realtime stream channel.
//!
//! Every message on the channel is a JSON text envelope of the form
//! `{"event": "<name>", "data": {...}}`. This crate owns that envelope, the
//! typed inbound/outbound event sets shared by the `client` and the dev host,
//! and the decoder for base64 frame images carried by `frame` events.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by the decoders in this crate.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not a JSON envelope.
    #[error("failed to decode event envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    /// The envelope named a known event but its payload did not match.
    #[error("invalid payload for `{event}`: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    /// The envelope named an event this client does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    /// A frame image was empty.
    #[error("frame image is empty")]
    EmptyImage,
    /// A frame image was not valid base64.
    #[error("frame image is not valid base64: {0}")]
    Image(#[from] base64::DecodeError),
}

/// Raw channel envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name, e.g. `"processing_progress"`.
    pub event: String,
    /// Event payload; absent payloads decode as `null`.
    #[serde(default)]
    pub data: Value,
}

// =============================================================================
// INBOUND
// =============================================================================

/// Events the backend pushes to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundEvent {
    /// Generic status line (`message`).
    Message(String),
    /// One processed video frame as base64 image data (`frame`).
    Frame { image: String, count: Option<u64> },
    /// Backend-reported error (`error`).
    Error(String),
    /// Stream finished on the backend side (`complete`).
    Complete(String),
    /// Processing progress (`processing_progress`). `progress` is a
    /// percentage when the backend supplies one.
    ProcessingProgress { frames: u64, progress: Option<f64> },
    /// Processing finished (`processing_complete`).
    ProcessingComplete { frames: u64 },
    /// Pause acknowledged (`stream_paused`).
    StreamPaused,
    /// Resume acknowledged (`stream_resumed`).
    StreamResumed,
    /// Stop acknowledged (`stream_stopped`).
    StreamStopped { reset: bool },
}

impl InboundEvent {
    /// Wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Frame { .. } => "frame",
            Self::Error(_) => "error",
            Self::Complete(_) => "complete",
            Self::ProcessingProgress { .. } => "processing_progress",
            Self::ProcessingComplete { .. } => "processing_complete",
            Self::StreamPaused => "stream_paused",
            Self::StreamResumed => "stream_resumed",
            Self::StreamStopped { .. } => "stream_stopped",
        }
    }
}

#[derive(Deserialize)]
struct FramePayload {
    frame: String,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct ProgressPayload {
    #[serde(default)]
    frames: u64,
    #[serde(default)]
    progress: Option<f64>,
}

#[derive(Deserialize)]
struct CompletePayload {
    #[serde(default)]
    frames: u64,
}

#[derive(Deserialize)]
struct StoppedPayload {
    #[serde(default)]
    reset: bool,
}

/// Decode a text message into its envelope without interpreting the payload.
///
/// # Errors
///
/// Returns [`CodecError::Envelope`] when the text is not a JSON envelope.
pub fn decode_envelope(text: &str) -> Result<Envelope, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a text message into a typed inbound event.
///
/// # Errors
///
/// Returns [`CodecError::Envelope`] for malformed JSON,
/// [`CodecError::Payload`] for known events with mismatched payloads, and
/// [`CodecError::UnknownEvent`] for names outside [`InboundEvent`].
pub fn decode_inbound(text: &str) -> Result<InboundEvent, CodecError> {
    let envelope = decode_envelope(text)?;
    inbound_from_envelope(envelope)
}

/// Interpret an already decoded envelope.
///
/// # Errors
///
/// See [`decode_inbound`].
pub fn inbound_from_envelope(envelope: Envelope) -> Result<InboundEvent, CodecError> {
    let Envelope { event, data } = envelope;
    let event_name = event.as_str();
    match event_name {
        "message" => Ok(InboundEvent::Message(text_field(&data))),
        "error" => Ok(InboundEvent::Error(text_field(&data))),
        "complete" => Ok(InboundEvent::Complete(text_field(&data))),
        "frame" => {
            let p: FramePayload = payload(event_name, data)?;
            Ok(InboundEvent::Frame { image: p.frame, count: p.count })
        }
        "processing_progress" => {
            let p: ProgressPayload = payload(event_name, data)?;
            Ok(InboundEvent::ProcessingProgress { frames: p.frames, progress: p.progress })
        }
        "processing_complete" => {
            let p: CompletePayload = payload(event_name, data)?;
            Ok(InboundEvent::ProcessingComplete { frames: p.frames })
        }
        "stream_paused" => Ok(InboundEvent::StreamPaused),
        "stream_resumed" => Ok(InboundEvent::StreamResumed),
        "stream_stopped" => {
            let p: StoppedPayload = payload(event_name, data)?;
            Ok(InboundEvent::StreamStopped { reset: p.reset })
        }
        _ => Err(CodecError::UnknownEvent(event)),
    }
}

fn payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, CodecError> {
    // Payload-less acknowledgements arrive as `null`; treat them as `{}`.
    let data = if data.is_null() { Value::Object(serde_json::Map::new()) } else { data };
    serde_json::from_value(data).map_err(|source| CodecError::Payload { event: event.to_owned(), source })
}

/// Text carried in `{"data": "..."}` payloads. Non-string values are rendered
/// as JSON so nothing the backend says is silently dropped.
fn text_field(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("data") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Control events the client sends to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutboundEvent {
    StopStreaming,
    StopProcessing,
    PauseStreaming,
    ResumeStreaming,
}

impl OutboundEvent {
    /// Wire name of this event.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::StopStreaming => "stop_streaming",
            Self::StopProcessing => "stop_processing",
            Self::PauseStreaming => "pause_streaming",
            Self::ResumeStreaming => "resume_streaming",
        }
    }

    /// Parse a wire name back into an outbound event.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stop_streaming" => Some(Self::StopStreaming),
            "stop_processing" => Some(Self::StopProcessing),
            "pause_streaming" => Some(Self::PauseStreaming),
            "resume_streaming" => Some(Self::ResumeStreaming),
            _ => None,
        }
    }
}

/// Encode an outbound event as a JSON text envelope with an empty payload.
#[must_use]
pub fn encode_outbound(event: OutboundEvent) -> String {
    serde_json::json!({ "event": event.name(), "data": {} }).to_string()
}

// =============================================================================
// FRAME IMAGES
// =============================================================================

/// Image container detected from the leading bytes of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    /// MIME type used when building a `data:` URL.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// Detect the format from magic bytes. Unrecognized data is assumed to be
    /// JPEG, which is what the processing backend encodes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0x89, b'P', b'N', b'G', ..] => Self::Png,
            [b'G', b'I', b'F', b'8', ..] => Self::Gif,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Self::Webp,
            _ => Self::Jpeg,
        }
    }
}

/// Number of base64 characters decoded to sniff the image header (12 bytes).
const SNIFF_CHARS: usize = 16;

/// A decoded-enough frame image, ready to attach to an `<img>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameImage {
    format: ImageFormat,
    encoded: String,
    /// Backend frame counter, when supplied.
    pub count: Option<u64>,
}

impl FrameImage {
    /// Build a frame image from base64 data.
    ///
    /// Only the header is decoded (format detection + validation); the body is
    /// kept encoded since the browser consumes it as a `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyImage`] for empty input and
    /// [`CodecError::Image`] when the header is not valid base64.
    pub fn from_base64(encoded: &str, count: Option<u64>) -> Result<Self, CodecError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(CodecError::EmptyImage);
        }
        let bytes = encoded.as_bytes();
        let head_len = bytes.len().min(SNIFF_CHARS) / 4 * 4;
        let head = if head_len == 0 { bytes } else { &bytes[..head_len] };
        let decoded = BASE64.decode(head)?;
        Ok(Self { format: ImageFormat::sniff(&decoded), encoded: encoded.to_owned(), count })
    }

    /// Detected image format.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// `data:` URL suitable for an `<img src>`.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime(), self.encoded)
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;
