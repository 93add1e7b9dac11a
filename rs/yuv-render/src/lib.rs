//! Frame rendering for native playback.
//!
//! This crate displays the frames received by a [yuv_lite::Player] using the GPU.
//!
//! # Architecture
//!
//! The renderer follows a simple pipeline:
//! 1. Split the frame payload into Y, U and V planes ([yuv_lite::codec]).
//! 2. Upload each plane into a single channel texture.
//! 3. Draw a full-screen quad, converting YUV to RGB in the fragment shader.
//!
//! GPU resources are created once by [initialize], which returns a [RenderContext].
//! A [RenderContext] is therefore always ready to render.
//!
//! [snapshot] performs the same conversion on the CPU, for debugging without a display.

mod video;

pub mod snapshot;

pub use video::*;
