//! Client state containers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `config` is the typed snapshot of the server configuration and `session`
//! is the single reactive record the whole UI renders from.

pub mod config;
pub mod session;
