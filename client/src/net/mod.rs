//! Networking: configuration fetch, realtime channel and video upload.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` fetches the client configuration, `transport` owns the websocket,
//! `channel` maps channel traffic onto the session, and `upload` drives the
//! multipart video upload.

pub mod api;
pub mod channel;
pub mod transport;
pub mod upload;
