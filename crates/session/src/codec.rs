//! Payload byte encoding.
//!
//! The session treats payloads as opaque; persisting them goes through an
//! injected [`PayloadCodec`]. [`PostcardCodec`] covers any serde payload and
//! [`BytesCodec`] passes raw blobs through untouched.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Payload encoding failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
	/// The payload could not be turned into bytes.
	#[error("failed to encode payload: {0}")]
	Encode(String),
	/// The bytes are malformed or truncated.
	#[error("failed to decode payload: {0}")]
	Decode(String),
}

/// Byte serialization capability for a payload type.
pub trait PayloadCodec<P> {
	/// Encodes a payload into an opaque blob.
	fn encode(&self, payload: &P) -> Result<Vec<u8>, CodecError>;

	/// Decodes a blob produced by [`encode`](Self::encode).
	fn decode(&self, bytes: &[u8]) -> Result<P, CodecError>;
}

/// Postcard encoding for serde payloads.
pub struct PostcardCodec<P> {
	_payload: PhantomData<fn() -> P>,
}

impl<P> PostcardCodec<P> {
	/// Creates the codec.
	pub const fn new() -> Self {
		Self {
			_payload: PhantomData,
		}
	}
}

impl<P> Default for PostcardCodec<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P> Clone for PostcardCodec<P> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<P> Copy for PostcardCodec<P> {}

impl<P> fmt::Debug for PostcardCodec<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PostcardCodec").finish()
	}
}

impl<P: Serialize + DeserializeOwned> PayloadCodec<P> for PostcardCodec<P> {
	fn encode(&self, payload: &P) -> Result<Vec<u8>, CodecError> {
		postcard::to_allocvec(payload).map_err(|e| CodecError::Encode(e.to_string()))
	}

	fn decode(&self, bytes: &[u8]) -> Result<P, CodecError> {
		postcard::from_bytes(bytes).map_err(|e| CodecError::Decode(e.to_string()))
	}
}

/// Identity codec for payloads that already are byte blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl PayloadCodec<Vec<u8>> for BytesCodec {
	fn encode(&self, payload: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
		Ok(payload.clone())
	}

	fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
		Ok(bytes.to_vec())
	}
}
