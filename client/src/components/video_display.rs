//! Live frame display with state-dependent placeholders.

#[cfg(test)]
#[path = "video_display_test.rs"]
mod video_display_test;

use leptos::prelude::*;

use crate::state::session::SessionState;

#[component]
pub fn VideoDisplay() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();

    let container_class = move || session.with(|s| video_container_class(s.streaming.paused));
    let frame_url = move || session.with(|s| s.streaming.current_frame.as_ref().map(events::FrameImage::data_url));
    let placeholder = move || session.with(Placeholder::for_session);

    view! {
        <div class=container_class>
            {move || match frame_url() {
                Some(src) => view! { <img src=src alt="Live stream" class="stream-image"/> }.into_any(),
                None => {
                    let p = placeholder();
                    if p.is_loading() {
                        view! {
                            <div class="placeholder">
                                <div class="loading-animation">
                                    <div class="loading-spinner"></div>
                                    <p>{p.text()}</p>
                                </div>
                            </div>
                        }
                            .into_any()
                    } else {
                        view! {
                            <div class="placeholder">
                                <div class="stream-placeholder">
                                    <span class="placeholder-icon">"📹"</span>
                                    <p>{p.text()}</p>
                                </div>
                            </div>
                        }
                            .into_any()
                    }
                }
            }}
        </div>
    }
}

/// What to show while no frame is available, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placeholder {
    Starting,
    Uploading,
    Processing,
    ProcessingPaused,
    Idle,
}

impl Placeholder {
    fn for_session(session: &SessionState) -> Self {
        if session.streaming.transitioning {
            Self::Starting
        } else if session.upload.active {
            Self::Uploading
        } else if session.processing.active && session.streaming.paused {
            Self::ProcessingPaused
        } else if session.processing.active {
            Self::Processing
        } else {
            Self::Idle
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::Starting => "Starting stream...",
            Self::Uploading => "Uploading video...",
            Self::Processing => "Processing and streaming video...",
            Self::ProcessingPaused => "Processing paused",
            Self::Idle => "Upload a video",
        }
    }

    fn is_loading(self) -> bool {
        self != Self::Idle
    }
}

fn video_container_class(paused: bool) -> &'static str {
    if paused { "video-container paused" } else { "video-container" }
}
