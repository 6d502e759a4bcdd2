//! Telegram Bot API adapter: outbound transport plus the long-polling loop.

pub mod api;
pub mod models;
pub mod poller;
