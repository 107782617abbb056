//! Upload form with progress bars and stream controls.
//!
//! SYSTEM CONTEXT
//! ==============
//! Reads `SessionState` to decide which controls are visible and routes user
//! intent to the upload handle (submit/cancel) and the channel adapter
//! (pause/continue/stop). The form never mutates session state directly.

#[cfg(test)]
#[path = "upload_form_test.rs"]
mod upload_form_test;

use leptos::prelude::*;

use crate::net::channel::{self, ChannelAdapter, ChannelSender};
use crate::net::upload::UploadHandle;
use crate::state::session::SessionState;

#[component]
pub fn UploadForm() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let adapter = expect_context::<StoredValue<ChannelAdapter>>();
    let sender = expect_context::<StoredValue<ChannelSender>>();
    let uploads = expect_context::<UploadHandle>();

    let file_input = NodeRef::<leptos::html::Input>::new();

    let uploading = move || session.with(|s| s.upload.active);
    let processing = move || session.with(|s| s.processing.active);
    let streaming = move || session.with(|s| s.streaming.active);
    let stoppable = move || session.with(show_stop);
    let idle = move || session.with(show_submit);
    let input_disabled = move || session.with(|s| !show_submit(s));
    let submit_disabled = move || session.with(|s| !s.can_upload());
    let upload_pct = move || session.with(|s| s.upload.progress_percent);
    let processing_pct = move || session.with(|s| s.processing.progress_percent);
    let pause_label = move || session.with(|s| pause_button_label(s.streaming.paused));

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        uploads.submit_from_input(session, file_input);
    };
    let on_cancel = move |_| uploads.cancel(session);
    let on_toggle_pause = move |_| channel::request_toggle_pause(session, adapter, sender);
    let on_stop = move |_| channel::request_stop(session, adapter, sender);

    view! {
        <div class="upload-section">
            <h3>"Upload Video"</h3>
            <form class="upload-form" on:submit=on_submit>
                <input
                    type="file"
                    class="file-input"
                    accept="video/*"
                    node_ref=file_input
                    disabled=input_disabled
                />

                <Show when=uploading>
                    <div class="progress-container">
                        <div class="progress-bar" style=move || progress_width_style(upload_pct())></div>
                        <span class="progress-text">{move || format!("{}%", upload_pct())}</span>
                        <button type="button" class="cancel-button" on:click=on_cancel>
                            "Cancel"
                        </button>
                    </div>
                </Show>

                <Show when=processing>
                    <div class="progress-container">
                        <div
                            class="progress-bar progress-bar--processing"
                            style=move || progress_width_style(processing_pct())
                        ></div>
                        <span class="progress-text">{move || processing_label(processing_pct())}</span>
                    </div>
                </Show>

                <Show when=stoppable>
                    <div class="streaming-controls">
                        <Show when=streaming>
                            <button type="button" class="pause-button" on:click=on_toggle_pause>
                                {pause_label}
                            </button>
                        </Show>
                        <button type="button" class="stop-button" on:click=on_stop>
                            "Stop"
                        </button>
                    </div>
                </Show>

                <Show when=idle>
                    <button type="submit" class="upload-button" disabled=submit_disabled>
                        "Process & Stream Video"
                    </button>
                </Show>
            </form>
        </div>
    }
}

/// The submit button (and an enabled file input) only appear when nothing is
/// uploading, processing or streaming.
fn show_submit(session: &SessionState) -> bool {
    !session.upload.active && !session.processing.active && !session.streaming.active
}

/// Stop is offered from the moment processing starts, before the first frame,
/// so a backend that fails without ever streaming can still be reset.
fn show_stop(session: &SessionState) -> bool {
    session.processing.active || session.streaming.active
}

fn pause_button_label(paused: bool) -> &'static str {
    if paused { "Continue" } else { "Pause" }
}

fn processing_label(percent: u8) -> String {
    format!("Processing: {percent}%")
}

fn progress_width_style(percent: u8) -> String {
    format!("width: {}%", percent.min(100))
}
