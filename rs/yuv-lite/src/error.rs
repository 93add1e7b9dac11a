use std::sync::Arc;

use crate::codec::DecodeError;

/// A list of possible errors that can occur during the session.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
	/// The underlying connection failed.
	#[error("transport error: {0}")]
	Transport(String),

	/// The connection was closed while sending.
	#[error("closed")]
	Closed,

	/// A message could not be encoded.
	#[error("encode error: {0}")]
	Encode(Arc<serde_json::Error>),
}

impl Error {
	/// Wrap an error reported by the connection.
	pub fn from_transport(err: impl std::fmt::Display) -> Self {
		tracing::warn!(%err, "transport error");
		Self::Transport(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during rendering.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum RenderError {
	#[error("failed to initialize renderer: {0}")]
	Init(String),

	#[error("failed to render frame: {0}")]
	Render(String),

	#[error("failed to decode frame: {0}")]
	Decode(#[from] DecodeError),
}
