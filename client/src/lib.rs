//! # client
//!
//! Leptos + WASM frontend for the motion-detection video streamer.
//!
//! This crate holds the session state, the realtime channel adapter and
//! websocket transport, the video upload submitter, and the presentation
//! components. The `ssr` feature renders the shell on the dev host; the
//! `hydrate` feature builds the browser bundle.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;

/// Browser entry point: install logging and hydrate the server-rendered body.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        leptos::logging::warn!("console logger already set: {e}");
    }
    leptos::mount::hydrate_body(app::App);
}
