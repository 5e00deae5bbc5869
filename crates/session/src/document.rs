//! Host document capability.
//!
//! The host owns live geometry and hands out [`Handle`]s for it. The session
//! never holds host memory, only handles, so anything that can add, replace,
//! remove and read back payloads by handle can stand in for the host.

use crate::handle::Handle;

/// Failure reported by a [`MutableDocument`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
	/// No active document can be reached.
	#[error("document unavailable: {0}")]
	Unavailable(String),
	/// The document has no object registered under the handle.
	#[error("no object registered under {0}")]
	HandleNotFound(Handle),
}

/// Mutable document capability required by the session.
///
/// Implementations are single-writer; callers must not invoke them
/// re-entrantly.
pub trait MutableDocument<P> {
	/// Registers a payload and returns the handle it is live under.
	fn add(&mut self, payload: &P) -> Result<Handle, DocumentError>;

	/// Drops whatever is registered under `handle` and registers `payload`.
	///
	/// Must succeed even when the previous registration is already gone.
	/// Returns the handle the payload is now live under, which is `handle`
	/// itself whenever [`preserves_identity`](Self::preserves_identity)
	/// holds.
	fn replace(&mut self, handle: Handle, payload: &P) -> Result<Handle, DocumentError>;

	/// Removes the registration under `handle`.
	fn remove(&mut self, handle: Handle) -> Result<(), DocumentError>;

	/// Reads the current value under `handle`.
	///
	/// Returns `Ok(None)` when the object was deleted outside the session.
	fn read_back(&self, handle: Handle) -> Result<Option<P>, DocumentError>;

	/// Fails with [`DocumentError::Unavailable`] when no document can be
	/// reached. Checked before any capability decision.
	fn check_available(&self) -> Result<(), DocumentError> {
		Ok(())
	}

	/// Returns true if [`replace`](Self::replace) keeps the same handle.
	fn preserves_identity(&self) -> bool {
		true
	}
}
