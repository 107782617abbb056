//! Status console: a one-line debug summary plus the message log.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every user-visible status line lands in `SessionState::messages`; this
//! component is the only place they are shown.

#[cfg(test)]
#[path = "message_console_test.rs"]
mod message_console_test;

use leptos::prelude::*;

use crate::state::session::SessionState;

const EMPTY_LOG_TEXT: &str = "System ready. No messages yet.";

#[component]
pub fn MessageConsole() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();

    let debug_line = move || session.with(debug_summary);
    let entries = move || session.with(|s| s.messages.iter().map(str::to_owned).collect::<Vec<_>>());

    view! {
        <div class="message-console">
            <h3>"Console"</h3>
            <div class="message-console__debug">
                <small>{debug_line}</small>
            </div>
            <div class="message-console__list">
                {move || {
                    let lines = entries();
                    if lines.is_empty() {
                        view! { <div class="message">{EMPTY_LOG_TEXT}</div> }.into_any()
                    } else {
                        lines
                            .into_iter()
                            .map(|line| view! { <div class="message">{line}</div> })
                            .collect_view()
                            .into_any()
                    }
                }}
            </div>
        </div>
    }
}

fn debug_summary(session: &SessionState) -> String {
    format!(
        "Stream: {} | Processing: {} | Paused: {}",
        if session.streaming.active { "Active" } else { "Inactive" },
        yes_no(session.processing.active),
        yes_no(session.streaming.paused),
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}
