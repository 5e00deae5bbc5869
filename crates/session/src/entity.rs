//! Edit lifecycle of a single payload.
//!
//! An entity is either **Detached** (no handle; its payload is
//! authoritative) or **Live** (registered with a document; its payload is
//! the last synced snapshot and the document holds the current value).
//!
//! ```text
//!            enter_edit                 enter_edit (re-register)
//! Detached ─────────────► Live ◄─────────────────────┐
//!    ▲                     │  └──────────────────────┘
//!    └─────────────────────┘
//!          commit_edit
//! ```

use tracing::{trace, warn};

use crate::config::IdentityPolicy;
use crate::document::{DocumentError, MutableDocument};
use crate::handle::Handle;

#[cfg(test)]
mod tests;

/// Per-entity transition failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
	/// The document could not be reached; the entity is unchanged.
	#[error("document unavailable: {0}")]
	DocumentUnavailable(String),
	/// Re-registration could not keep the entity's external identity.
	#[error("document could not keep identity {requested} on re-registration")]
	IdentityNotPreserved {
		/// Handle the entity was live under.
		requested: Handle,
		/// Handle the document issued instead, if it re-registered at all.
		issued: Option<Handle>,
	},
	/// The document rejected a handle the entity holds.
	#[error("document rejected handle {0}")]
	UnknownHandle(Handle),
}

impl From<DocumentError> for EntityError {
	fn from(err: DocumentError) -> Self {
		match err {
			DocumentError::Unavailable(reason) => Self::DocumentUnavailable(reason),
			DocumentError::HandleNotFound(handle) => Self::UnknownHandle(handle),
		}
	}
}

/// Observable lifecycle state of an [`EditableEntity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
	/// Not registered with any document.
	Detached,
	/// Registered with a document under the handle.
	Live(Handle),
}

/// Result of [`EditableEntity::commit_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
	/// The entity was already detached; nothing was touched.
	NotLive,
	/// The live value was read back and the registration released.
	Committed,
	/// The object was deleted outside the session; the last synced payload
	/// is kept and the entity is detached.
	HandleMissing,
}

/// One payload and its optional live registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableEntity<P> {
	payload: P,
	handle: Option<Handle>,
}

impl<P> EditableEntity<P> {
	/// Creates a detached entity.
	pub fn new(payload: P) -> Self {
		Self {
			payload,
			handle: None,
		}
	}

	/// Best-known payload.
	///
	/// Authoritative only while detached; for a live entity this is the last
	/// synced snapshot.
	pub fn payload(&self) -> &P {
		&self.payload
	}

	/// Overwrites the held payload without touching the document.
	pub fn set_payload(&mut self, payload: P) {
		self.payload = payload;
	}

	/// Handle of the live registration, if any.
	pub fn handle(&self) -> Option<Handle> {
		self.handle
	}

	/// Returns true while registered with a document.
	pub fn is_live(&self) -> bool {
		self.handle.is_some()
	}

	/// Current lifecycle state.
	pub fn state(&self) -> EntityState {
		match self.handle {
			Some(handle) => EntityState::Live(handle),
			None => EntityState::Detached,
		}
	}

	/// Registers the payload with `doc`, or re-registers it if already live.
	///
	/// Re-registration pushes the held payload back under the same handle.
	/// Availability is checked before the identity capability, so an
	/// unreachable document always reports [`EntityError::DocumentUnavailable`].
	/// With [`IdentityPolicy::Strict`] a document that cannot keep the handle
	/// is refused up front, and one that silently issues a different handle
	/// yields [`EntityError::IdentityNotPreserved`]; the entity then tracks
	/// the issued handle so a later commit still releases it.
	pub fn enter_edit<D>(
		&mut self,
		doc: &mut D,
		policy: IdentityPolicy,
	) -> Result<Handle, EntityError>
	where
		D: MutableDocument<P> + ?Sized,
	{
		let Some(requested) = self.handle else {
			let handle = doc.add(&self.payload)?;
			self.handle = Some(handle);
			trace!(%handle, "entity registered");
			return Ok(handle);
		};

		doc.check_available()?;
		if policy == IdentityPolicy::Strict && !doc.preserves_identity() {
			return Err(EntityError::IdentityNotPreserved {
				requested,
				issued: None,
			});
		}

		let issued = doc.replace(requested, &self.payload)?;
		self.handle = Some(issued);
		if issued == requested {
			trace!(handle = %issued, "entity re-registered");
			return Ok(issued);
		}

		match policy {
			IdentityPolicy::Strict => Err(EntityError::IdentityNotPreserved {
				requested,
				issued: Some(issued),
			}),
			IdentityPolicy::Adopt => {
				warn!(%requested, %issued, "entity re-registered under a new handle");
				Ok(issued)
			}
		}
	}

	/// Pulls the live value back from `doc` and releases the registration.
	///
	/// A detached entity is left alone. If the document no longer knows the
	/// handle, whether it reads back nothing or reports
	/// [`DocumentError::HandleNotFound`], the held payload is kept and the
	/// entity detaches.
	pub fn commit_edit<D>(&mut self, doc: &mut D) -> Result<CommitOutcome, EntityError>
	where
		D: MutableDocument<P> + ?Sized,
	{
		let Some(handle) = self.handle else {
			return Ok(CommitOutcome::NotLive);
		};

		let current = match doc.read_back(handle) {
			Ok(Some(current)) => current,
			Ok(None) | Err(DocumentError::HandleNotFound(_)) => {
				warn!(
					%handle,
					"live object deleted outside the session, keeping last synced payload"
				);
				self.handle = None;
				return Ok(CommitOutcome::HandleMissing);
			}
			Err(err) => return Err(err.into()),
		};

		match doc.remove(handle) {
			Ok(()) | Err(DocumentError::HandleNotFound(_)) => {}
			Err(err) => return Err(err.into()),
		}

		self.payload = current;
		self.handle = None;
		trace!(%handle, "entity committed");
		Ok(CommitOutcome::Committed)
	}
}
