use bytes::Bytes;
use grappelli_core::exception::{Error, Result};

/// Request body: raw bytes off the wire, or a value an upstream layer
/// already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
	Raw(Bytes),
	Json(serde_json::Value),
}

impl Default for RequestBody {
	fn default() -> Self {
		RequestBody::Raw(Bytes::new())
	}
}

impl RequestBody {
	/// Whether the body carries no content.
	pub fn is_empty(&self) -> bool {
		match self {
			RequestBody::Raw(bytes) => bytes.is_empty(),
			RequestBody::Json(value) => value.is_null(),
		}
	}

	/// Body bytes; a decoded body is serialized back to JSON.
	pub fn to_bytes(&self) -> Result<Bytes> {
		match self {
			RequestBody::Raw(bytes) => Ok(bytes.clone()),
			RequestBody::Json(value) => Ok(Bytes::from(serde_json::to_vec(value)?)),
		}
	}

	/// Deserializes the body as JSON.
	pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
		let parsed = match self {
			RequestBody::Raw(bytes) => serde_json::from_slice(bytes),
			RequestBody::Json(value) => serde_json::from_value(value.clone()),
		};
		parsed.map_err(|e| Error::Validation(format!("invalid JSON body: {}", e)))
	}
}
