//! Edit-in-place session management for geometry payloads.
//!
//! A payload is either held inertly by an [`EditableEntity`] or registered
//! with a host [`MutableDocument`] where a user can reshape it. The
//! [`EditSession`] owns an ordered batch of entities, drives the
//! enter/commit protocol across the whole batch, and persists the batch as a
//! versioned [`SessionRecord`]. Handles issued by the document are never
//! persisted; only payloads and the global edit flag survive a restart.

/// Payload byte encoding capability.
pub mod codec;
/// Session configuration loaded from TOML.
pub mod config;
/// Host document capability and its failures.
pub mod document;
/// Single-payload edit lifecycle.
pub mod entity;
/// Opaque external handles.
pub mod handle;
/// In-memory reference document.
pub mod memory;
/// Versioned persisted-state record.
pub mod record;
/// Batch session over ordered entities.
pub mod session;

pub use codec::{BytesCodec, CodecError, PayloadCodec, PostcardCodec};
pub use config::{ConfigError, IdentityPolicy, SessionConfig, SnapshotPolicy};
pub use document::{DocumentError, MutableDocument};
pub use entity::{CommitOutcome, EditableEntity, EntityError, EntityState};
pub use handle::Handle;
pub use memory::MemoryDocument;
pub use record::{RecordError, RecordValue, SessionRecord};
pub use session::{
	EDIT_MODE_LABEL, EditSession, EntityFailure, Invocation, ModeReport, RestoreFailure,
	RestoreReport, SessionError,
};
