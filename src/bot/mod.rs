//! Chat-facing side: command parsing, conversation state and message rendering.

pub mod commands;
pub mod flow;
pub mod render;
pub mod session;
pub mod transport;
