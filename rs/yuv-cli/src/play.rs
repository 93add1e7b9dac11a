use std::path::PathBuf;

use anyhow::Context;
use yuv_lite::{Chroma, Frame, Player, PlayerConfig, RenderError, Renderer};
use yuv_native::ClientConfig;
use yuv_render::{RenderContext, Target};

use crate::console;

/// The size of the offscreen render target.
#[derive(clap::Args, Clone, Debug)]
pub struct TargetConfig {
	#[arg(id = "width", long = "width", default_value_t = 480, env = "YUV_TARGET_WIDTH")]
	pub width: u32,

	#[arg(id = "height", long = "height", default_value_t = 270, env = "YUV_TARGET_HEIGHT")]
	pub height: u32,
}

/// Renders to the GPU, a PNG file, both or neither.
pub struct Output {
	chroma: Chroma,
	gpu: Option<RenderContext>,
	snapshot: Option<PathBuf>,
}

impl Output {
	pub async fn new(chroma: Chroma, target: Option<TargetConfig>, snapshot: Option<PathBuf>) -> anyhow::Result<Self> {
		let gpu = match target {
			Some(target) => Some(
				yuv_render::initialize(Target::offscreen(target.width, target.height), chroma)
					.await
					.context("failed to initialize renderer")?,
			),
			None => None,
		};

		if let Some(path) = &snapshot {
			tracing::info!(path = %path.display(), "writing snapshots");
		}

		Ok(Self { chroma, gpu, snapshot })
	}
}

impl Renderer for Output {
	fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
		// Decoded once and shared, so a bad frame is reported even without a GPU.
		let picture = frame.decode(self.chroma)?;

		if let Some(gpu) = &mut self.gpu {
			gpu.render_picture(&picture)?;
		}

		if let Some(path) = &self.snapshot {
			yuv_render::snapshot::save(&picture, path).map_err(|err| RenderError::Render(err.to_string()))?;
		}

		Ok(())
	}
}

pub async fn play(client: ClientConfig, config: PlayerConfig, output: Output) -> anyhow::Result<()> {
	let transport = client.connect().await?;
	let (player, handle) = Player::new(transport, output, config);

	tokio::select! {
		res = player.run() => res.context("playback failed"),
		res = console::run(handle) => res,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;
	use yuv_lite::DecodeError;

	fn frame(data: Vec<u8>) -> Frame {
		Frame {
			data: Bytes::from(data),
			width: 2,
			height: 2,
			index: 0,
		}
	}

	#[tokio::test]
	async fn test_snapshot_only() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frame.png");

		let mut output = Output::new(Chroma::Yuv420, None, Some(path.clone())).await.unwrap();
		output.render(&frame(vec![128; 6])).unwrap();

		let image = image::open(&path).unwrap();
		assert_eq!((image.width(), image.height()), (2, 2));
	}

	#[tokio::test]
	async fn test_bad_frame() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frame.png");

		let mut output = Output::new(Chroma::Yuv422, None, Some(path.clone())).await.unwrap();

		// Six bytes is a 4:2:0 frame, two short of 4:2:2.
		let err = output.render(&frame(vec![128; 6])).unwrap_err();
		assert!(matches!(err, RenderError::Decode(DecodeError::WrongSize { expected: 8, actual: 6 })), "{err:?}");
		assert!(!path.exists());
	}
}
