//! Root application component with routing and context providers.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::net::api::fetch_client_config;
use crate::net::channel::{ChannelAdapter, ChannelSender};
use crate::net::transport::spawn_channel;
use crate::net::upload::UploadHandle;
use crate::pages::stream::StreamPage;
use crate::state::session::SessionState;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the session, channel and upload handles, then loads the server
/// configuration once in the browser. The channel and uploads stay disabled
/// until that configuration arrives.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let session = RwSignal::new(SessionState::default());
    let adapter = StoredValue::new(ChannelAdapter::default());
    let sender = StoredValue::new(ChannelSender::default());
    let uploads = UploadHandle::new();

    provide_context(session);
    provide_context(adapter);
    provide_context(sender);
    provide_context(uploads);

    // Effects only run in the browser.
    Effect::new(move || {
        leptos::task::spawn_local(start_session(session, adapter, sender, uploads));
    });

    view! {
        <Stylesheet id="leptos" href="/pkg/motionstream.css"/>
        <Title text="Motion Detection Stream"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("") view=StreamPage/>
            </Routes>
        </Router>
    }
}

async fn start_session(
    session: RwSignal<SessionState>,
    adapter: StoredValue<ChannelAdapter>,
    sender: StoredValue<ChannelSender>,
    uploads: UploadHandle,
) {
    let config = match fetch_client_config().await {
        Ok(config) => config.sanitized(),
        Err(e) => {
            leptos::logging::warn!("failed to load configuration: {e}");
            return;
        }
    };

    uploads.configure(session, config.upload.clone());
    sender.set_value(spawn_channel(session, adapter, &config.websocket));
    session.update(|s| {
        s.apply_config(config);
        s.record_message("Ready to process and stream videos");
    });
}
