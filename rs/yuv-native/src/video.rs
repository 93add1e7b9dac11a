use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use yuv_lite::{Chroma, Frame, Metadata};

/// A raw planar video held in memory, split into frames.
///
/// The input is the concatenation of every frame's Y, U and V planes with no header,
/// ex. the output of `ffmpeg -f rawvideo -pix_fmt yuv422p`.
#[derive(Debug, Clone)]
pub struct Video {
	frames: Vec<Bytes>,
	width: u32,
	height: u32,
}

impl Video {
	/// Read the whole file into memory.
	pub async fn open(path: impl AsRef<Path>, width: u32, height: u32, chroma: Chroma) -> anyhow::Result<Self> {
		let path = path.as_ref();
		let data = tokio::fs::read(path)
			.await
			.with_context(|| format!("failed to read {}", path.display()))?;

		let video = Self::from_bytes(data.into(), width, height, chroma)?;
		tracing::info!(path = %path.display(), frames = video.len(), width, height, %chroma, "loaded video");

		Ok(video)
	}

	pub fn from_bytes(data: Bytes, width: u32, height: u32, chroma: Chroma) -> anyhow::Result<Self> {
		anyhow::ensure!(
			width > 0 && height > 0 && width % 2 == 0 && height % 2 == 0,
			"dimensions must be even and non-zero: {width}x{height}"
		);

		let size = chroma
			.frame_size(width, height)
			.with_context(|| format!("frame too large: {width}x{height}"))?;
		anyhow::ensure!(
			data.len() % size == 0,
			"trailing partial frame: {} bytes is not a multiple of {size}",
			data.len()
		);

		let frames = (0..data.len() / size)
			.map(|i| data.slice(i * size..(i + 1) * size))
			.collect();

		Ok(Self { frames, width, height })
	}

	pub fn len(&self) -> u64 {
		self.frames.len() as u64
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	pub fn metadata(&self) -> Metadata {
		Metadata { frame_count: self.len() }
	}

	/// The frame at the given index, or `None` if it's out of range.
	pub fn frame(&self, index: u64) -> Option<Frame> {
		let data = self.frames.get(usize::try_from(index).ok()?)?;

		Some(Frame {
			data: data.clone(),
			width: self.width,
			height: self.height,
			index,
		})
	}
}
