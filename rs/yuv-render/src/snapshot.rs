//! CPU conversion of a [Picture] into an RGB image.
//!
//! Uses the same BT.601 coefficients as the shader, so a snapshot matches what's displayed.

use std::path::Path;

use yuv_lite::{Chroma, Picture};

/// Convert a single 8-bit YUV sample into RGB.
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
	let y = y as f32;
	let u = u as f32 - 127.5;
	let v = v as f32 - 127.5;

	let r = y + 1.402 * v;
	let g = y - 0.344136 * u - 0.714136 * v;
	let b = y + 1.772 * u;

	[r, g, b].map(|c| c.round().clamp(0.0, 255.0) as u8)
}

/// Convert a decoded picture into an RGB image of the same dimensions.
pub fn rgb(picture: &Picture) -> image::RgbImage {
	let chroma_width = picture.u.width as usize;

	image::RgbImage::from_fn(picture.width(), picture.height(), |x, y| {
		let luma = (y * picture.width() + x) as usize;

		let row = match picture.chroma {
			Chroma::Yuv422 => y,
			Chroma::Yuv420 => y / 2,
		};
		let sample = row as usize * chroma_width + (x / 2) as usize;

		image::Rgb(yuv_to_rgb(
			picture.y.data[luma],
			picture.u.data[sample],
			picture.v.data[sample],
		))
	})
}

/// Write the picture to disk, with the format chosen by the file extension.
pub fn save(picture: &Picture, path: &Path) -> image::ImageResult<()> {
	rgb(picture).save(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bytes::Bytes;

	#[test]
	fn test_primaries() {
		let [r, g, b] = yuv_to_rgb(76, 85, 255);
		assert!(r >= 254, "red: {r}");
		assert_eq!(g, 0);
		assert!(b <= 1, "blue: {b}");

		// Neutral chroma is grey.
		for c in yuv_to_rgb(128, 128, 128) {
			assert!(c.abs_diff(128) <= 1, "grey: {c}");
		}
		assert!(yuv_to_rgb(255, 128, 128).iter().all(|&c| c >= 254));
	}

	#[test]
	fn test_chroma_420() {
		// 4x2 luma, two chroma samples side by side.
		let payload = Bytes::from(vec![
			128, 128, 128, 128, //
			128, 128, 128, 128, //
			0, 255, // U
			128, 128, // V
		]);

		let picture = yuv_lite::codec::decode(&payload, 4, 2, Chroma::Yuv420).unwrap();
		let image = rgb(&picture);

		// Low U pulls blue down on the left half, high U pushes it up on the right.
		for y in 0..2 {
			assert!(image.get_pixel(0, y)[2] < 10);
			assert!(image.get_pixel(1, y)[2] < 10);
			assert!(image.get_pixel(2, y)[2] > 245);
			assert!(image.get_pixel(3, y)[2] > 245);
		}
	}

	#[test]
	fn test_chroma_422() {
		// 2x2 luma, one chroma sample per row.
		let payload = Bytes::from(vec![
			128, 128, //
			128, 128, //
			0, 255, // U
			128, 128, // V
		]);

		let picture = yuv_lite::codec::decode(&payload, 2, 2, Chroma::Yuv422).unwrap();
		let image = rgb(&picture);

		assert!(image.get_pixel(0, 0)[2] < 10);
		assert!(image.get_pixel(1, 0)[2] < 10);
		assert!(image.get_pixel(0, 1)[2] > 245);
		assert!(image.get_pixel(1, 1)[2] > 245);
	}

	#[test]
	fn test_save_png() {
		let payload = Bytes::from(vec![16; Chroma::Yuv420.frame_size(4, 4).unwrap()]);
		let picture = yuv_lite::codec::decode(&payload, 4, 4, Chroma::Yuv420).unwrap();

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frame.png");
		save(&picture, &path).unwrap();

		let image = image::open(&path).unwrap().to_rgb8();
		assert_eq!(image.dimensions(), (4, 4));
	}
}
