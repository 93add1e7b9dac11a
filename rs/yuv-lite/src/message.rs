//! JSON messages exchanged with the frame server.
//!
//! Every message is an object of the form `{"type": ..., "payload": {...}}`.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{self, Chroma, DecodeError, Picture};

/// A single frame as served by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	/// The planar payload, base64 on the wire.
	#[serde(rename = "yuvData", with = "yuv_data")]
	pub data: Bytes,

	pub width: u32,
	pub height: u32,

	/// The position of this frame in the sequence.
	#[serde(rename = "frameNumber")]
	pub index: u64,
}

impl Frame {
	/// Split the payload into planes, see [codec::decode].
	pub fn decode(&self, chroma: Chroma) -> Result<Picture, DecodeError> {
		codec::decode(&self.data, self.width, self.height, chroma)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
	#[serde(rename = "frameCount")]
	pub frame_count: u64,
}

/// A message sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Inbound {
	Frame(Frame),
	Metadata(Metadata),
}

/// A message sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Outbound {
	RequestFrame { frame: u64 },
}

macro_rules! json {
	($ty:ty) => {
		impl $ty {
			pub fn to_json(&self) -> Result<String, serde_json::Error> {
				serde_json::to_string(self)
			}

			pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
				serde_json::from_str(text)
			}
		}
	};
}

json!(Inbound);
json!(Outbound);

mod yuv_data {
	use super::*;

	pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&codec::encode_base64(data))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
		let text = String::deserialize(deserializer)?;
		codec::decode_base64(&text).map_err(serde::de::Error::custom)
	}
}
