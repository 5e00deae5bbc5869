//! Versioned persisted-state record.
//!
//! A record is a flat map of typed fields, written and read the same way a
//! host archive chunk is:
//!
//! | key             | type  |                                   |
//! |-----------------|-------|-----------------------------------|
//! | `version`       | int   | always [`RECORD_VERSION`]         |
//! | `edit_mode`     | bool  | global edit flag                  |
//! | `entity_count`  | int   | number of entity blobs            |
//! | `entity.{i}`    | bytes | encoded payload of entity `i`     |
//!
//! Unknown keys are ignored. The whole map is stored as postcard bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current record layout version.
pub const RECORD_VERSION: i64 = 1;

pub(crate) const KEY_VERSION: &str = "version";
pub(crate) const KEY_EDIT_MODE: &str = "edit_mode";
pub(crate) const KEY_ENTITY_COUNT: &str = "entity_count";

/// Key of the payload blob for entity `index`.
pub fn entity_key(index: usize) -> String {
	format!("entity.{index}")
}

/// Structural problem with a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
	/// A required field is absent.
	#[error("missing record field '{0}'")]
	MissingField(String),
	/// A field holds a value of the wrong type.
	#[error("record field '{field}' is {found}, expected {expected}")]
	WrongType {
		/// Field key.
		field: String,
		/// Expected type name.
		expected: &'static str,
		/// Stored type name.
		found: &'static str,
	},
	/// The record was written by an unknown layout version.
	#[error("unsupported record version {0}")]
	UnsupportedVersion(i64),
	/// The entity count is negative.
	#[error("invalid entity count {0}")]
	InvalidCount(i64),
	/// The container bytes could not be encoded or decoded.
	#[error("malformed record: {0}")]
	Malformed(String),
}

/// A single typed record value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordValue {
	/// Boolean flag.
	Bool(bool),
	/// Signed integer.
	Int(i64),
	/// Opaque byte blob.
	Bytes(Vec<u8>),
}

impl RecordValue {
	/// Type name used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Bytes(_) => "bytes",
		}
	}
}

/// Validated header of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
	pub(crate) edit_mode: bool,
	pub(crate) entity_count: usize,
}

/// Keyed map of typed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
	fields: BTreeMap<String, RecordValue>,
}

impl SessionRecord {
	/// Creates an empty record.
	pub fn new() -> Self {
		Self::default()
	}

	/// Iterates stored keys in order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	/// Stores a value, replacing any previous one.
	pub fn set(&mut self, key: impl Into<String>, value: RecordValue) {
		self.fields.insert(key.into(), value);
	}

	/// Removes and returns the value under `key`.
	pub fn remove(&mut self, key: &str) -> Option<RecordValue> {
		self.fields.remove(key)
	}

	/// Reads a boolean field.
	pub fn get_bool(&self, key: &str) -> Result<bool, RecordError> {
		match self.require(key)? {
			RecordValue::Bool(value) => Ok(*value),
			other => Err(wrong_type(key, "bool", other)),
		}
	}

	/// Reads an integer field.
	pub fn get_int(&self, key: &str) -> Result<i64, RecordError> {
		match self.require(key)? {
			RecordValue::Int(value) => Ok(*value),
			other => Err(wrong_type(key, "int", other)),
		}
	}

	/// Reads a byte blob field.
	pub fn get_bytes(&self, key: &str) -> Result<&[u8], RecordError> {
		match self.require(key)? {
			RecordValue::Bytes(value) => Ok(value),
			other => Err(wrong_type(key, "bytes", other)),
		}
	}

	/// Encodes the record as postcard bytes.
	pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
		postcard::to_allocvec(self).map_err(|e| RecordError::Malformed(e.to_string()))
	}

	/// Decodes a record from postcard bytes.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
		postcard::from_bytes(bytes).map_err(|e| RecordError::Malformed(e.to_string()))
	}

	/// Checks version, mode, count, and the presence and type of every
	/// entity blob. Payload bytes themselves are not decoded here.
	pub(crate) fn header(&self) -> Result<RecordHeader, RecordError> {
		let version = self.get_int(KEY_VERSION)?;
		if version != RECORD_VERSION {
			return Err(RecordError::UnsupportedVersion(version));
		}

		let edit_mode = self.get_bool(KEY_EDIT_MODE)?;
		let count = self.get_int(KEY_ENTITY_COUNT)?;
		let entity_count = usize::try_from(count).map_err(|_| RecordError::InvalidCount(count))?;

		for index in 0..entity_count {
			self.get_bytes(&entity_key(index))?;
		}

		Ok(RecordHeader {
			edit_mode,
			entity_count,
		})
	}

	fn require(&self, key: &str) -> Result<&RecordValue, RecordError> {
		self.fields
			.get(key)
			.ok_or_else(|| RecordError::MissingField(key.to_string()))
	}
}

fn wrong_type(key: &str, expected: &'static str, found: &RecordValue) -> RecordError {
	RecordError::WrongType {
		field: key.to_string(),
		expected,
		found: found.kind(),
	}
}
