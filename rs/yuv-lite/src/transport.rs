use std::future::Future;

use crate::{Inbound, Outbound, Result};

/// A duplex connection carrying JSON messages to and from the frame server.
///
/// Implementations drop malformed inbound messages (logging a warning) instead of returning them.
pub trait Transport: Send {
	/// Send a single message.
	fn send(&mut self, msg: Outbound) -> impl Future<Output = Result<()>> + Send;

	/// Wait for the next well-formed message, or `None` once the connection is closed.
	///
	/// This must be cancel-safe; it is polled from a `select!` loop.
	fn recv(&mut self) -> impl Future<Output = Result<Option<Inbound>>> + Send;
}
