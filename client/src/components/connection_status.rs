//! Connection badge for the realtime channel.

#[cfg(test)]
#[path = "connection_status_test.rs"]
mod connection_status_test;

use leptos::prelude::*;

use crate::state::session::{ConnectionStatus, SessionState};

/// Colored dot plus label reflecting `SessionState::connection`.
#[component]
pub fn ConnectionBadge() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let status = move || session.with(|s| s.connection);

    view! {
        <div class=move || connection_badge_class(status())>
            <div class="connection-dot"></div>
            <span>{move || connection_label(status())}</span>
        </div>
    }
}

fn connection_label(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "Connected",
        ConnectionStatus::Connecting => "Connecting",
        ConnectionStatus::Disconnected => "Disconnected",
        ConnectionStatus::Error => "Error",
    }
}

fn connection_badge_class(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connected => "connection-badge connection-badge--connected",
        ConnectionStatus::Connecting => "connection-badge connection-badge--connecting",
        ConnectionStatus::Disconnected => "connection-badge connection-badge--disconnected",
        ConnectionStatus::Error => "connection-badge connection-badge--error",
    }
}
