//! Helper library for native applications using yuv-lite.
//!
//! - [ClientConfig] connects to a frame server over WebSocket, returning a [WebSocket] [yuv_lite::Transport].
//! - [ServerConfig] serves the frames of a raw [Video] file to WebSocket clients.
//! - [PlayerArgs] and [Log] expose the remaining configuration as CLI flags, environment variables or TOML.

mod client;
mod log;
mod player;
mod server;
mod video;
mod websocket;

pub use client::*;
pub use log::*;
pub use player::*;
pub use server::*;
pub use video::*;
pub use websocket::*;

// Re-export these crates.
pub use yuv_lite;
