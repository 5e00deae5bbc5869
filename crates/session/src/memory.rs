//! In-memory [`MutableDocument`] for tests and scripted runs.
//!
//! Besides the capability itself it exposes the knobs a host would turn from
//! the outside: a user editing or deleting a live object, the document going
//! away, and a host that cannot keep identity across re-registration.

use std::collections::BTreeMap;

use tracing::trace;

use crate::document::{DocumentError, MutableDocument};
use crate::handle::Handle;

/// Map-backed document keyed by [`Handle`].
#[derive(Debug, Clone)]
pub struct MemoryDocument<P> {
	objects: BTreeMap<Handle, P>,
	available: bool,
	preserve_identity: bool,
	mutations: usize,
}

impl<P> MemoryDocument<P> {
	/// Creates an empty, available document that preserves identity.
	pub fn new() -> Self {
		Self {
			objects: BTreeMap::new(),
			available: true,
			preserve_identity: true,
			mutations: 0,
		}
	}

	/// Simulates the host document appearing or disappearing.
	pub fn set_available(&mut self, available: bool) {
		self.available = available;
	}

	/// Controls whether [`MutableDocument::replace`] reuses the old handle.
	pub fn set_preserve_identity(&mut self, preserve: bool) {
		self.preserve_identity = preserve;
	}

	/// Number of live objects.
	pub fn len(&self) -> usize {
		self.objects.len()
	}

	/// Returns true if no objects are live.
	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	/// Returns true if an object is registered under `handle`.
	pub fn contains(&self, handle: Handle) -> bool {
		self.objects.contains_key(&handle)
	}

	/// Returns the object registered under `handle`.
	pub fn get(&self, handle: Handle) -> Option<&P> {
		self.objects.get(&handle)
	}

	/// Count of add/replace/remove calls made through the capability.
	pub fn mutation_count(&self) -> usize {
		self.mutations
	}

	/// Simulates a user reshaping a live object. Returns false if absent.
	pub fn user_edit(&mut self, handle: Handle, payload: P) -> bool {
		match self.objects.get_mut(&handle) {
			Some(slot) => {
				*slot = payload;
				true
			}
			None => false,
		}
	}

	/// Simulates a user deleting a live object. Returns false if absent.
	pub fn user_delete(&mut self, handle: Handle) -> bool {
		self.objects.remove(&handle).is_some()
	}

	fn ensure_available(&self) -> Result<(), DocumentError> {
		if self.available {
			Ok(())
		} else {
			Err(DocumentError::Unavailable("no active document".into()))
		}
	}
}

impl<P> Default for MemoryDocument<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P: Clone> MutableDocument<P> for MemoryDocument<P> {
	fn add(&mut self, payload: &P) -> Result<Handle, DocumentError> {
		self.ensure_available()?;
		let handle = Handle::new_v4();
		self.objects.insert(handle, payload.clone());
		self.mutations += 1;
		trace!(%handle, objects = self.objects.len(), "document: add");
		Ok(handle)
	}

	fn replace(&mut self, handle: Handle, payload: &P) -> Result<Handle, DocumentError> {
		self.ensure_available()?;
		self.objects.remove(&handle);
		let issued = if self.preserve_identity {
			handle
		} else {
			Handle::new_v4()
		};
		self.objects.insert(issued, payload.clone());
		self.mutations += 1;
		trace!(%handle, %issued, "document: replace");
		Ok(issued)
	}

	fn remove(&mut self, handle: Handle) -> Result<(), DocumentError> {
		self.ensure_available()?;
		self.mutations += 1;
		match self.objects.remove(&handle) {
			Some(_) => {
				trace!(%handle, "document: remove");
				Ok(())
			}
			None => Err(DocumentError::HandleNotFound(handle)),
		}
	}

	fn read_back(&self, handle: Handle) -> Result<Option<P>, DocumentError> {
		self.ensure_available()?;
		Ok(self.objects.get(&handle).cloned())
	}

	fn check_available(&self) -> Result<(), DocumentError> {
		self.ensure_available()
	}

	fn preserves_identity(&self) -> bool {
		self.preserve_identity
	}
}
