//! Telegram bot that liquidates OKX spot holdings into USDT, either all at
//! once or through a step-by-step asset and fraction selection.

pub mod bot;
pub mod config;
pub mod error;
pub mod exchange;
pub mod liquidation;
pub mod observability;
pub mod telegram;
pub mod types;
