//! Planar YUV payload decoding.
//!
//! A frame payload is three planes stored back to back: a full resolution luma (Y) plane followed by two
//! chroma planes (U then V). The chroma plane size depends on the [Chroma] layout in use.
//!
//! Decoding is a pure slicing step; the planes share the payload's allocation.

use base64::Engine;
use bytes::Bytes;

/// An error produced while decoding a frame payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
	#[error("empty frame: {width}x{height}")]
	Empty { width: u32, height: u32 },

	#[error("odd frame dimensions: {width}x{height}")]
	OddDimensions { width: u32, height: u32 },

	#[error("frame too large: {width}x{height}")]
	TooLarge { width: u32, height: u32 },

	#[error("wrong payload size: expected={expected} actual={actual}")]
	WrongSize { expected: usize, actual: usize },

	#[error("base64 length {0} is not a multiple of 4")]
	Block(usize),

	#[error("invalid base64: {0}")]
	Base64(String),
}

/// The chroma subsampling of a planar payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Chroma {
	/// Chroma planes are half width and full height.
	#[default]
	#[serde(rename = "422")]
	Yuv422,

	/// Chroma planes are half width and half height.
	#[serde(rename = "420")]
	Yuv420,
}

impl Chroma {
	/// The dimensions of a single chroma plane for a `width` x `height` frame.
	pub const fn plane(self, width: u32, height: u32) -> (u32, u32) {
		match self {
			Self::Yuv422 => (width / 2, height),
			Self::Yuv420 => (width / 2, height / 2),
		}
	}

	/// The total payload size of a `width` x `height` frame, or `None` if it doesn't fit in memory.
	pub fn frame_size(self, width: u32, height: u32) -> Option<usize> {
		let luma = (width as usize).checked_mul(height as usize)?;
		let (w, h) = self.plane(width, height);
		let chroma = (w as usize).checked_mul(h as usize)?.checked_mul(2)?;
		luma.checked_add(chroma)
	}
}

impl std::fmt::Display for Chroma {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Yuv422 => write!(f, "422"),
			Self::Yuv420 => write!(f, "420"),
		}
	}
}

impl std::str::FromStr for Chroma {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"422" | "yuv422" | "yuv422p" => Ok(Self::Yuv422),
			"420" | "yuv420" | "yuv420p" => Ok(Self::Yuv420),
			_ => Err(format!("unknown chroma layout: {s}")),
		}
	}
}

/// A single plane of 8-bit samples, tightly packed (stride == width).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
	pub width: u32,
	pub height: u32,
	pub data: Bytes,
}

/// A payload split into its Y, U and V planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
	pub chroma: Chroma,
	pub y: Plane,
	pub u: Plane,
	pub v: Plane,
}

impl Picture {
	pub fn width(&self) -> u32 {
		self.y.width
	}

	pub fn height(&self) -> u32 {
		self.y.height
	}
}

/// Split a planar payload into its three planes.
///
/// The payload length must match [Chroma::frame_size] exactly and both dimensions must be even and non-zero.
pub fn decode(payload: &Bytes, width: u32, height: u32, chroma: Chroma) -> Result<Picture, DecodeError> {
	if width == 0 || height == 0 {
		return Err(DecodeError::Empty { width, height });
	}

	if width % 2 != 0 || height % 2 != 0 {
		return Err(DecodeError::OddDimensions { width, height });
	}

	let expected = chroma
		.frame_size(width, height)
		.ok_or(DecodeError::TooLarge { width, height })?;
	if payload.len() != expected {
		return Err(DecodeError::WrongSize {
			expected,
			actual: payload.len(),
		});
	}

	let luma = width as usize * height as usize;
	let (cw, ch) = chroma.plane(width, height);
	let plane = cw as usize * ch as usize;

	Ok(Picture {
		chroma,
		y: Plane {
			width,
			height,
			data: payload.slice(..luma),
		},
		u: Plane {
			width: cw,
			height: ch,
			data: payload.slice(luma..luma + plane),
		},
		v: Plane {
			width: cw,
			height: ch,
			data: payload.slice(luma + plane..),
		},
	})
}

/// Decode the text encoding used on the wire into raw bytes.
///
/// Standard alphabet with padding, so the input must be a whole number of 4 character blocks.
pub fn decode_base64(text: &str) -> Result<Bytes, DecodeError> {
	if text.len() % 4 != 0 {
		return Err(DecodeError::Block(text.len()));
	}

	base64::engine::general_purpose::STANDARD
		.decode(text)
		.map(Bytes::from)
		.map_err(|err| DecodeError::Base64(err.to_string()))
}

/// The inverse of [decode_base64].
pub fn encode_base64(data: &[u8]) -> String {
	base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn payload(len: usize) -> Bytes {
		Bytes::from((0..len).map(|i| i as u8).collect::<Vec<_>>())
	}

	#[test]
	fn test_yuv422_plane_lengths() {
		for (w, h) in [(2, 2), (4, 2), (16, 10), (480, 270)] {
			let data = payload(Chroma::Yuv422.frame_size(w, h).unwrap());
			let picture = decode(&data, w, h, Chroma::Yuv422).unwrap();

			let y = picture.y.data.len();
			let u = picture.u.data.len();
			let v = picture.v.data.len();

			assert_eq!(y, (w * h) as usize);
			assert_eq!(u, (w / 2 * h) as usize);
			assert_eq!(v, (w / 2 * h) as usize);
			assert_eq!(y + u + v, data.len());
			assert_eq!((picture.u.width, picture.u.height), (w / 2, h));
		}
	}

	#[test]
	fn test_yuv422_offsets() {
		// 4x2: Y = 8 bytes, U = 4 bytes, V = 4 bytes
		let data = payload(16);
		let picture = decode(&data, 4, 2, Chroma::Yuv422).unwrap();

		assert_eq!(picture.y.data.as_ref(), &[0, 1, 2, 3, 4, 5, 6, 7]);
		assert_eq!(picture.u.data.as_ref(), &[8, 9, 10, 11]);
		assert_eq!(picture.v.data.as_ref(), &[12, 13, 14, 15]);
	}

	#[test]
	fn test_yuv420_two_by_two() {
		let data = Bytes::from_static(&[10, 20, 30, 40, 128, 64]);
		let picture = decode(&data, 2, 2, Chroma::Yuv420).unwrap();

		assert_eq!(picture.y.data.as_ref(), &[10, 20, 30, 40]);
		assert_eq!(picture.u.data.as_ref(), &[128]);
		assert_eq!(picture.v.data.as_ref(), &[64]);
		assert_eq!((picture.width(), picture.height()), (2, 2));
	}

	#[test]
	fn test_wrong_size() {
		for len in [0, 5, 7, 9, 100] {
			let err = decode(&payload(len), 2, 2, Chroma::Yuv422).unwrap_err();
			assert_eq!(err, DecodeError::WrongSize { expected: 8, actual: len });
		}

		let err = decode(&payload(8), 2, 2, Chroma::Yuv420).unwrap_err();
		assert_eq!(err, DecodeError::WrongSize { expected: 6, actual: 8 });
	}

	#[test]
	fn test_bad_dimensions() {
		assert_eq!(
			decode(&payload(0), 0, 2, Chroma::Yuv422).unwrap_err(),
			DecodeError::Empty { width: 0, height: 2 }
		);
		assert_eq!(
			decode(&payload(6), 3, 1, Chroma::Yuv422).unwrap_err(),
			DecodeError::OddDimensions { width: 3, height: 1 }
		);
	}

	#[test]
	fn test_huge_dimensions() {
		let (w, h) = (u32::MAX - 1, u32::MAX - 1);

		// Larger than a 64-bit usize.
		for chroma in [Chroma::Yuv422, Chroma::Yuv420] {
			assert_eq!(chroma.frame_size(w, h), None);
			assert_eq!(
				decode(&Bytes::new(), w, h, chroma).unwrap_err(),
				DecodeError::TooLarge { width: w, height: h }
			);
		}
	}

	#[test]
	fn test_base64() {
		let data = decode_base64("CgsMDQ4P").unwrap();
		assert_eq!(data.as_ref(), &[10, 11, 12, 13, 14, 15]);
		assert_eq!(encode_base64(&data), "CgsMDQ4P");

		assert_eq!(decode_base64("CgsMDQ4").unwrap_err(), DecodeError::Block(7));
		assert!(matches!(decode_base64("Cg$$").unwrap_err(), DecodeError::Base64(_)));
	}

	#[test]
	fn test_chroma_parse() {
		assert_eq!("422".parse::<Chroma>().unwrap(), Chroma::Yuv422);
		assert_eq!("yuv420p".parse::<Chroma>().unwrap(), Chroma::Yuv420);
		assert!("444".parse::<Chroma>().is_err());
		assert_eq!(Chroma::Yuv420.to_string(), "420");
	}
}
