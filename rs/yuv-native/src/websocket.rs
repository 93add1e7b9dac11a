use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use yuv_lite::{Error, Inbound, Outbound, Result, Transport};

/// A [Transport] over a WebSocket connection, with one JSON message per text frame.
pub struct WebSocket {
	stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocket {
	pub fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
		Self { stream }
	}

	fn parse(text: &str) -> Option<Inbound> {
		match Inbound::from_json(text) {
			Ok(msg) => Some(msg),
			Err(err) => {
				tracing::warn!(%err, "ignoring malformed message");
				None
			}
		}
	}
}

impl Transport for WebSocket {
	async fn send(&mut self, msg: Outbound) -> Result<()> {
		let text = msg.to_json().map_err(|err| Error::Encode(Arc::new(err)))?;
		self.stream.send(Message::text(text)).await.map_err(map_err)
	}

	async fn recv(&mut self) -> Result<Option<Inbound>> {
		while let Some(msg) = self.stream.next().await {
			let msg = match msg {
				Ok(msg) => msg,
				Err(tungstenite::Error::ConnectionClosed) => break,
				Err(err) => return Err(map_err(err)),
			};

			let parsed = match msg {
				Message::Text(text) => Self::parse(text.as_str()),
				Message::Binary(data) => match std::str::from_utf8(&data) {
					Ok(text) => Self::parse(text),
					Err(err) => {
						tracing::warn!(%err, "ignoring binary message");
						None
					}
				},
				Message::Close(frame) => {
					tracing::debug!(?frame, "received close");
					break;
				}
				// Pings are answered by tungstenite.
				Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
			};

			if let Some(msg) = parsed {
				return Ok(Some(msg));
			}
		}

		Ok(None)
	}
}

fn map_err(err: tungstenite::Error) -> Error {
	match err {
		tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => Error::Closed,
		err => Error::from_transport(err),
	}
}
