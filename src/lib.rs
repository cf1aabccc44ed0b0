//! WhatsApp relay — send yes/no alerts and record the replies.

pub mod alert;
pub mod classify;
pub mod config;
pub mod error;
pub mod phone;
pub mod provider;
pub mod server;
pub mod store;
pub mod webhook;
