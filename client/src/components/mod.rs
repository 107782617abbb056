//! Presentation components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render snapshots of the session read from Leptos context and
//! forward user intent to the upload handle and channel adapter.

pub mod connection_status;
pub mod message_console;
pub mod upload_form;
pub mod video_display;
