//! # yuv-lite: remote YUV frame playback
//!
//! `yuv-lite` is the transport-agnostic core of a remote frame viewer.
//! A client asks a server for individual frames of a video by index, receives each one as a planar YUV
//! payload, and hands it to a [Renderer].
//!
//! ## API
//!
//! - [codec]: splits a planar payload into its Y, U and V [Plane]s.
//! - [Inbound] / [Outbound]: the JSON messages exchanged with the server.
//! - [Transport]: a duplex connection carrying those messages, implemented elsewhere (ex. `yuv-native`).
//! - [Renderer]: displays a [Frame], implemented elsewhere (ex. `yuv-render`).
//! - [Controller]: the play/pause/stop/seek state machine, returning a [Transition] for each operation.
//! - [Player]: the event loop applying those transitions, controlled via a [PlayerHandle].

mod error;
mod message;
mod playback;
mod player;
mod render;
mod transport;

pub mod codec;

pub use codec::{Chroma, DecodeError, Picture, Plane};
pub use error::*;
pub use message::*;
pub use playback::*;
pub use player::*;
pub use render::*;
pub use transport::*;
