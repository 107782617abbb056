//! Single-page upload and streaming screen.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sidebar with the connection badge, upload form and console; main area
//! with the live frame display. All state comes from context provided by
//! `App`.

use leptos::prelude::*;

use crate::components::connection_status::ConnectionBadge;
use crate::components::message_console::MessageConsole;
use crate::components::upload_form::UploadForm;
use crate::components::video_display::VideoDisplay;

#[component]
pub fn StreamPage() -> impl IntoView {
    view! {
        <div class="app-container">
            <div class="sidebar">
                <div class="logo">
                    <h1>"Motion Detection"</h1>
                </div>
                <ConnectionBadge/>
                <UploadForm/>
                <MessageConsole/>
            </div>
            <div class="main-content">
                <VideoDisplay/>
            </div>
        </div>
    }
}
