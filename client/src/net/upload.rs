//! Video upload with progress, cancel and outcome reporting.
//!
//! SYSTEM CONTEXT
//! ==============
//! The upload form hands the selected file to an [`UploadHandle`]. The handle
//! owns one [`UploadSubmitter`], which validates the file, starts the
//! transfer through an [`UploadTransport`] and turns transport callbacks
//! ([`UploadEvent`]) into session updates and status messages.
//!
//! DESIGN
//! ======
//! The submitter is generic over its transport so the validation, progress
//! and outcome rules run natively in tests. The browser transport is an
//! `XMLHttpRequest` (fetch has no upload progress), posting a multipart form
//! with a single `video` field.
//!
//! ERROR HANDLING
//! ==============
//! Every failure ends the upload and records exactly one user-visible
//! message; nothing here panics or propagates.

#[cfg(test)]
#[path = "upload_test.rs"]
mod upload_test;

use leptos::prelude::*;

use crate::state::config::{UploadConfig, rounded_mb};
use crate::state::session::SessionState;

/// Backend endpoint receiving the multipart upload.
pub const UPLOAD_ENDPOINT: &str = "/api/upload_video";
/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "video";

/// A byte-moving backend for [`UploadSubmitter`].
pub trait UploadTransport {
    /// What gets sent (a browser `File`, or a stand-in in tests).
    type Payload;

    /// Begin an asynchronous transfer. Results arrive later as
    /// [`UploadEvent`]s.
    ///
    /// # Errors
    ///
    /// Returns a description when the transfer could not be started at all.
    fn start(&mut self, payload: &Self::Payload, timeout_ms: u32) -> Result<(), String>;

    /// Abort the in-flight transfer. Returns whether one was running.
    fn abort(&mut self) -> bool;
}

/// A file chosen by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadCandidate<P> {
    pub name: String,
    pub size_bytes: u64,
    pub mime: String,
    pub payload: P,
}

/// Why a file was refused before any bytes were sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadRejection {
    MissingFile,
    TooLarge { max_mb: u64, size_mb: u64 },
    NotVideo,
}

impl UploadRejection {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MissingFile => "Please select a video file first".to_owned(),
            Self::TooLarge { max_mb, size_mb } => {
                format!("File too large. Maximum size is {max_mb}MB. Your file is {size_mb}MB")
            }
            Self::NotVideo => "Please select a valid video file".to_owned(),
        }
    }
}

/// Pre-flight checks, in order: presence, size, MIME type.
///
/// # Errors
///
/// Returns the first [`UploadRejection`] that applies.
pub fn validate<'a, P>(
    candidate: Option<&'a UploadCandidate<P>>,
    config: &UploadConfig,
) -> Result<&'a UploadCandidate<P>, UploadRejection> {
    let candidate = candidate.ok_or(UploadRejection::MissingFile)?;
    if candidate.size_bytes > config.max_file_size_bytes() {
        return Err(UploadRejection::TooLarge {
            max_mb: config.max_file_size_mb,
            size_mb: rounded_mb(candidate.size_bytes),
        });
    }
    if !candidate.mime.starts_with("video/") {
        return Err(UploadRejection::NotVideo);
    }
    Ok(candidate)
}

/// Whole percent of `loaded` over `total`; `None` when the total is unknown.
#[must_use]
pub fn percent_of(loaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let pct = (u128::from(loaded.min(total)) * 100 + u128::from(total) / 2) / u128::from(total);
    u8::try_from(pct).ok()
}

/// Throttles "Upload progress" messages to one per crossed interval step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressNotifier {
    interval: u8,
    last_step: u8,
}

impl ProgressNotifier {
    #[must_use]
    pub fn new(interval: u8) -> Self {
        Self { interval: interval.max(1), last_step: 0 }
    }

    /// Message to record for `percent`, if it reached a new step.
    pub fn observe(&mut self, percent: u8) -> Option<String> {
        let step = percent / self.interval;
        if step <= self.last_step {
            return None;
        }
        self.last_step = step;
        Some(format!("Upload progress: {percent}%"))
    }
}

/// Transport callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadEvent {
    Progress { loaded: u64, total: u64 },
    Loaded { status: u16, status_text: String, body: String },
    NetworkError,
    TimedOut,
}

/// What an [`UploadEvent`] meant for the upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Still transferring.
    InProgress,
    /// Accepted by the backend; processing has begun.
    Succeeded,
    /// Ended with an error message recorded.
    Failed,
    /// Nothing was in flight.
    Ignored,
}

/// One-at-a-time upload driver.
pub struct UploadSubmitter<T: UploadTransport> {
    transport: T,
    config: UploadConfig,
    notifier: ProgressNotifier,
    in_flight: bool,
}

impl<T: UploadTransport> UploadSubmitter<T> {
    pub fn new(transport: T, config: UploadConfig) -> Self {
        let notifier = ProgressNotifier::new(config.progress_notification_interval);
        Self { transport, config, notifier, in_flight: false }
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate and start an upload. Returns whether a transfer began.
    pub fn submit(&mut self, session: &mut SessionState, candidate: Option<UploadCandidate<T::Payload>>) -> bool {
        let candidate = match validate(candidate.as_ref(), &self.config) {
            Ok(candidate) => candidate,
            Err(rejection) => {
                session.record_message(rejection.message());
                return false;
            }
        };

        session.begin_upload();
        session.record_message(format!(
            "Uploading video: {} ({} MB)",
            candidate.name,
            rounded_mb(candidate.size_bytes)
        ));
        self.notifier = ProgressNotifier::new(self.config.progress_notification_interval);

        match self.transport.start(&candidate.payload, self.config.timeout_ms) {
            Ok(()) => {
                self.in_flight = true;
                true
            }
            Err(e) => {
                leptos::logging::warn!("upload could not start: {e}");
                session.fail_upload(e);
                session.record_message("Upload failed due to network error. Please try again.");
                false
            }
        }
    }

    pub fn on_event(&mut self, session: &mut SessionState, event: UploadEvent) -> UploadOutcome {
        if !self.in_flight {
            return UploadOutcome::Ignored;
        }
        match event {
            UploadEvent::Progress { loaded, total } => {
                if let Some(percent) = percent_of(loaded, total) {
                    session.set_upload_progress(percent);
                    if let Some(message) = self.notifier.observe(percent) {
                        session.record_message(message);
                    }
                }
                UploadOutcome::InProgress
            }
            UploadEvent::Loaded { status, status_text, body } => {
                self.in_flight = false;
                if !(200..300).contains(&status) {
                    leptos::logging::warn!("upload rejected ({status}): {body}");
                    session.fail_upload(format!("{status} {status_text}"));
                    session.record_message(format!("Upload failed: Server returned {status} {status_text}"));
                    return UploadOutcome::Failed;
                }
                if let Err(e) = serde_json::from_str::<serde_json::Value>(&body) {
                    leptos::logging::warn!("upload response is not JSON: {e}");
                    session.fail_upload("Could not parse server response");
                    session.record_message("Upload error: Could not parse server response");
                    return UploadOutcome::Failed;
                }
                session.end_upload();
                session.record_message("Upload complete! Processing and streaming video...");
                session.begin_processing();
                UploadOutcome::Succeeded
            }
            UploadEvent::NetworkError => {
                self.in_flight = false;
                session.fail_upload("network error");
                session.record_message("Upload failed due to network error. Please try again.");
                UploadOutcome::Failed
            }
            UploadEvent::TimedOut => {
                self.in_flight = false;
                session.fail_upload("timed out");
                session.record_message("Upload timed out. Please try a smaller file or check your connection.");
                UploadOutcome::Failed
            }
        }
    }

    /// Abort any transfer and clear the upload flag. Always records
    /// "Upload canceled", even when nothing was running.
    pub fn cancel(&mut self, session: &mut SessionState) {
        if self.in_flight {
            self.transport.abort();
            self.in_flight = false;
        }
        session.end_upload();
        session.record_message("Upload canceled");
    }
}

// =============================================================================
// BROWSER TRANSPORT
// =============================================================================

#[cfg(feature = "hydrate")]
type ProgressClosure = wasm_bindgen::closure::Closure<dyn FnMut(web_sys::ProgressEvent)>;

/// `XMLHttpRequest` transport posting to [`UPLOAD_ENDPOINT`].
#[cfg(feature = "hydrate")]
pub struct XhrTransport {
    xhr: Option<web_sys::XmlHttpRequest>,
    on_event: std::rc::Rc<dyn Fn(UploadEvent)>,
    // Kept alive for as long as the request may call them.
    handlers: Vec<ProgressClosure>,
}

#[cfg(feature = "hydrate")]
impl XhrTransport {
    pub fn new(on_event: impl Fn(UploadEvent) + 'static) -> Self {
        Self { xhr: None, on_event: std::rc::Rc::new(on_event), handlers: Vec::new() }
    }

    fn handler(&self, map: impl Fn(&web_sys::ProgressEvent) -> Option<UploadEvent> + 'static) -> ProgressClosure {
        let on_event = std::rc::Rc::clone(&self.on_event);
        ProgressClosure::new(move |event: web_sys::ProgressEvent| {
            if let Some(upload_event) = map(&event) {
                on_event(upload_event);
            }
        })
    }
}

#[cfg(feature = "hydrate")]
fn js_error(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;
    value
        .dyn_ref::<js_sys::Error>()
        .map_or_else(|| format!("{value:?}"), |e| String::from(e.message()))
}

#[cfg(feature = "hydrate")]
impl UploadTransport for XhrTransport {
    type Payload = web_sys::File;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn start(&mut self, payload: &web_sys::File, timeout_ms: u32) -> Result<(), String> {
        use wasm_bindgen::JsCast;

        let xhr = web_sys::XmlHttpRequest::new().map_err(|e| js_error(&e))?;
        xhr.open_with_async("POST", UPLOAD_ENDPOINT, true).map_err(|e| js_error(&e))?;
        xhr.set_timeout(timeout_ms);

        let form = web_sys::FormData::new().map_err(|e| js_error(&e))?;
        form.append_with_blob(UPLOAD_FIELD, payload).map_err(|e| js_error(&e))?;

        let progress = self.handler(|e| {
            e.length_computable().then(|| UploadEvent::Progress { loaded: e.loaded() as u64, total: e.total() as u64 })
        });
        let load = {
            let xhr = xhr.clone();
            self.handler(move |_| {
                Some(UploadEvent::Loaded {
                    status: xhr.status().unwrap_or(0),
                    status_text: xhr.status_text().unwrap_or_default(),
                    body: xhr.response_text().ok().flatten().unwrap_or_default(),
                })
            })
        };
        let error = self.handler(|_| Some(UploadEvent::NetworkError));
        let timeout = self.handler(|_| Some(UploadEvent::TimedOut));

        xhr.upload()
            .map_err(|e| js_error(&e))?
            .set_onprogress(Some(progress.as_ref().unchecked_ref()));
        xhr.set_onload(Some(load.as_ref().unchecked_ref()));
        xhr.set_onerror(Some(error.as_ref().unchecked_ref()));
        xhr.set_ontimeout(Some(timeout.as_ref().unchecked_ref()));

        xhr.send_with_opt_form_data(Some(&form)).map_err(|e| js_error(&e))?;

        self.handlers = vec![progress, load, error, timeout];
        self.xhr = Some(xhr);
        Ok(())
    }

    fn abort(&mut self) -> bool {
        match self.xhr.take() {
            Some(xhr) => {
                if let Err(e) = xhr.abort() {
                    leptos::logging::warn!("upload abort failed: {}", js_error(&e));
                }
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// CONTEXT HANDLE
// =============================================================================

/// Copyable handle to the page's upload submitter, provided via context.
///
/// The submitter exists only in the browser once configuration has loaded;
/// every method is a no-op before that and during SSR.
#[derive(Clone, Copy)]
pub struct UploadHandle {
    #[cfg(feature = "hydrate")]
    inner: StoredValue<Option<UploadSubmitter<XhrTransport>>, LocalStorage>,
}

impl UploadHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "hydrate")]
            inner: StoredValue::new_local(None),
        }
    }

    /// Install the submitter for the loaded configuration.
    pub fn configure(self, session: RwSignal<SessionState>, config: UploadConfig) {
        #[cfg(feature = "hydrate")]
        {
            let inner = self.inner;
            let transport = XhrTransport::new(move |event| {
                inner.update_value(|slot| {
                    if let Some(submitter) = slot.as_mut() {
                        session.update(|s| {
                            if submitter.on_event(s, event) == UploadOutcome::Succeeded {
                                leptos::logging::log!("upload accepted; awaiting stream");
                            }
                        });
                    }
                });
            });
            inner.set_value(Some(UploadSubmitter::new(transport, config)));
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (session, config);
    }

    /// Submit the first file selected in `input`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn submit_from_input(self, session: RwSignal<SessionState>, input: NodeRef<leptos::html::Input>) {
        #[cfg(feature = "hydrate")]
        {
            let candidate = input
                .get_untracked()
                .and_then(|el| el.files())
                .and_then(|files| files.get(0))
                .map(|file| UploadCandidate {
                    name: file.name(),
                    size_bytes: file.size() as u64,
                    mime: file.type_(),
                    payload: file,
                });
            self.inner.update_value(|slot| match slot.as_mut() {
                Some(submitter) => session.update(|s| {
                    submitter.submit(s, candidate);
                }),
                None => leptos::logging::warn!("upload submitted before configuration loaded"),
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (session, input);
    }

    pub fn cancel(self, session: RwSignal<SessionState>) {
        #[cfg(feature = "hydrate")]
        self.inner.update_value(|slot| match slot.as_mut() {
            Some(submitter) => session.update(|s| submitter.cancel(s)),
            None => session.update(|s| {
                s.end_upload();
                s.record_message("Upload canceled");
            }),
        });
        #[cfg(not(feature = "hydrate"))]
        session.update(|s| {
            s.end_upload();
            s.record_message("Upload canceled");
        });
    }
}

impl Default for UploadHandle {
    fn default() -> Self {
        Self::new()
    }
}
