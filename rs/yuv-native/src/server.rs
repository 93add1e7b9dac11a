use std::net;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use yuv_lite::{Inbound, Outbound};

use crate::Video;

/// Configuration for the frame server.
#[derive(Clone, Debug, clap::Parser, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
#[non_exhaustive]
pub struct ServerConfig {
	/// Listen for HTTP connections on the given address.
	#[arg(id = "server-bind", long = "server-bind", default_value = "[::]:8080", env = "YUV_SERVER_BIND")]
	pub bind: net::SocketAddr,

	/// The path of the WebSocket endpoint.
	#[arg(id = "server-path", long = "server-path", default_value = "/websocket", env = "YUV_SERVER_PATH")]
	pub path: String,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			bind: "[::]:8080".parse().unwrap(),
			path: "/websocket".to_string(),
		}
	}
}

impl ServerConfig {
	/// Bind the listener, but don't accept connections yet.
	pub async fn init(self, video: Video) -> anyhow::Result<Server> {
		anyhow::ensure!(self.path.starts_with('/'), "path must start with '/': {}", self.path);

		let listener = tokio::net::TcpListener::bind(self.bind)
			.await
			.with_context(|| format!("failed to bind {}", self.bind))?;

		Ok(Server {
			listener,
			router: router(Arc::new(video), &self.path),
		})
	}
}

/// Serves frames of a single [Video] to any number of WebSocket clients.
pub struct Server {
	listener: tokio::net::TcpListener,
	router: Router,
}

impl Server {
	pub fn local_addr(&self) -> anyhow::Result<net::SocketAddr> {
		self.listener.local_addr().context("failed to get local address")
	}

	pub async fn run(self) -> anyhow::Result<()> {
		tracing::info!(addr = ?self.listener.local_addr().ok(), "listening");
		axum::serve(self.listener, self.router).await.context("server failed")
	}
}

#[derive(Clone)]
struct AppState {
	video: Arc<Video>,
	conn_id: Arc<AtomicU64>,
}

/// Build the HTTP routes, with the WebSocket endpoint at `path`.
///
/// Connections from any origin are accepted.
pub fn router(video: Arc<Video>, path: &str) -> Router {
	let state = AppState {
		video,
		conn_id: Default::default(),
	};

	Router::new().route(path, get(upgrade)).with_state(state)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
	let id = state.conn_id.fetch_add(1, Ordering::Relaxed);

	ws.on_upgrade(move |socket| async move {
		if let Err(err) = run_session(id, socket, state.video).await {
			tracing::warn!(%err, "session failed");
		}
	})
}

#[tracing::instrument("session", skip_all, fields(id = id))]
async fn run_session(id: u64, mut socket: WebSocket, video: Arc<Video>) -> anyhow::Result<()> {
	tracing::info!("accepted session");

	send(&mut socket, Inbound::Metadata(video.metadata())).await?;

	while let Some(msg) = socket.recv().await {
		let text = match msg.context("failed to receive message")? {
			Message::Text(text) => text,
			Message::Close(_) => break,
			_ => continue,
		};

		match Outbound::from_json(text.as_str()) {
			Ok(Outbound::RequestFrame { frame }) => match video.frame(frame) {
				Some(frame) => send(&mut socket, Inbound::Frame(frame)).await?,
				None => tracing::warn!(frame, total = video.len(), "requested frame out of range"),
			},
			Err(err) => tracing::warn!(%err, "ignoring unknown message"),
		}
	}

	tracing::info!("session closed");

	Ok(())
}

async fn send(socket: &mut WebSocket, msg: Inbound) -> anyhow::Result<()> {
	let text = msg.to_json()?;
	socket.send(Message::Text(text.into())).await.context("failed to send message")
}
