use anyhow::Context;
use url::Url;
use yuv_lite::Chroma;

use crate::WebSocket;

const DEFAULT_URL: &str = "ws://localhost:8080/websocket";

/// Configuration for connecting to a frame server.
#[derive(Clone, Debug, clap::Parser, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
#[non_exhaustive]
pub struct ClientConfig {
	/// The WebSocket endpoint of the frame server.
	///
	/// `http://` URLs are upgraded to `ws://`.
	#[arg(id = "url", long = "url", default_value = DEFAULT_URL, env = "YUV_CLIENT_URL")]
	pub url: Url,

	/// The chroma layout of the frames sent by the server: `422` or `420`.
	#[arg(id = "chroma", long = "chroma", default_value = "422", env = "YUV_CHROMA")]
	pub chroma: Chroma,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			url: Url::parse(DEFAULT_URL).unwrap(),
			chroma: Chroma::default(),
		}
	}
}

impl ClientConfig {
	/// Open the WebSocket connection.
	pub async fn connect(&self) -> anyhow::Result<WebSocket> {
		let mut url = self.url.clone();

		match url.scheme() {
			"ws" => {}
			"http" => url
				.set_scheme("ws")
				.map_err(|_| anyhow::anyhow!("failed to set scheme: {url}"))?,
			scheme => anyhow::bail!("unsupported URL scheme: {scheme}"),
		}

		tracing::debug!(%url, "connecting");

		let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
			.await
			.with_context(|| format!("failed to connect to {url}"))?;

		tracing::info!(%url, "connected");

		Ok(WebSocket::new(stream))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	#[test]
	fn test_defaults() {
		let config = ClientConfig::parse_from(["test"]);
		assert_eq!(config.url.as_str(), DEFAULT_URL);
		assert_eq!(config.chroma, Chroma::Yuv422);

		let config: ClientConfig = toml::from_str("").unwrap();
		assert_eq!(config.url.as_str(), DEFAULT_URL);
	}

	#[test]
	fn test_cli() {
		let config = ClientConfig::parse_from(["test", "--url", "ws://example.com:9000/frames", "--chroma", "yuv420p"]);
		assert_eq!(config.url.port(), Some(9000));
		assert_eq!(config.chroma, Chroma::Yuv420);

		assert!(ClientConfig::try_parse_from(["test", "--chroma", "444"]).is_err());
	}

	#[test]
	fn test_toml() {
		let toml = r#"
			url = "ws://10.0.0.1:8080/websocket"
			chroma = "420"
		"#;

		let mut config: ClientConfig = toml::from_str(toml).unwrap();
		assert_eq!(config.url.host_str(), Some("10.0.0.1"));
		assert_eq!(config.chroma, Chroma::Yuv420);

		// CLI args re-applied on top of the file.
		config.update_from(["test", "--chroma", "422"]);
		assert_eq!(config.chroma, Chroma::Yuv422);

		assert!(toml::from_str::<ClientConfig>("jwt = \"nope\"").is_err());
	}

	#[tokio::test]
	async fn test_unsupported_scheme() {
		let mut config = ClientConfig::default();
		config.url = Url::parse("https://localhost/websocket").unwrap();

		let err = config.connect().await.err().unwrap();
		assert!(err.to_string().contains("unsupported URL scheme"));
	}
}
