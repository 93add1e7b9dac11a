use std::path::PathBuf;

use yuv_lite::Chroma;
use yuv_native::{ServerConfig, Video};

pub async fn serve(config: ServerConfig, input: PathBuf, width: u32, height: u32, chroma: Chroma) -> anyhow::Result<()> {
	let video = Video::open(&input, width, height, chroma).await?;
	if video.is_empty() {
		tracing::warn!(input = %input.display(), "video has no frames");
	}

	let server = config.init(video).await?;

	tokio::select! {
		res = server.run() => res,
		res = tokio::signal::ctrl_c() => {
			tracing::info!("shutting down");
			res.map_err(Into::into)
		}
	}
}
