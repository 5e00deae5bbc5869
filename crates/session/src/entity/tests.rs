use super::*;
use crate::memory::MemoryDocument;

fn mesh(name: &str) -> String {
	name.to_string()
}

#[test]
fn test_new_entity_is_detached() {
	let entity = EditableEntity::new(mesh("meshA"));
	assert_eq!(entity.state(), EntityState::Detached);
	assert!(!entity.is_live());
	assert_eq!(entity.payload(), "meshA");
}

#[test]
fn test_enter_edit_registers_payload() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));

	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();

	assert_eq!(entity.state(), EntityState::Live(handle));
	assert_eq!(doc.get(handle).map(String::as_str), Some("meshA"));
}

#[test]
fn test_reenter_edit_keeps_handle_and_resets_live_value() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.user_edit(handle, mesh("meshA'"));

	let again = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();

	assert_eq!(again, handle);
	assert_eq!(doc.len(), 1);
	assert_eq!(doc.get(handle).map(String::as_str), Some("meshA"));
}

#[test]
fn test_reenter_edit_restores_externally_deleted_object() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.user_delete(handle);

	let again = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();

	assert_eq!(again, handle);
	assert!(doc.contains(handle));
}

#[test]
fn test_strict_identity_refuses_document_that_cannot_preserve() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.set_preserve_identity(false);
	let before = doc.mutation_count();

	let err = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap_err();

	assert_eq!(
		err,
		EntityError::IdentityNotPreserved {
			requested: handle,
			issued: None,
		}
	);
	assert_eq!(doc.mutation_count(), before);
	assert_eq!(entity.handle(), Some(handle));
}

/// Claims to preserve identity but always issues a fresh handle.
struct LyingDocument(MemoryDocument<String>);

impl MutableDocument<String> for LyingDocument {
	fn add(&mut self, payload: &String) -> Result<Handle, DocumentError> {
		self.0.add(payload)
	}

	fn replace(&mut self, handle: Handle, payload: &String) -> Result<Handle, DocumentError> {
		self.0.remove(handle).ok();
		self.0.add(payload)
	}

	fn remove(&mut self, handle: Handle) -> Result<(), DocumentError> {
		self.0.remove(handle)
	}

	fn read_back(&self, handle: Handle) -> Result<Option<String>, DocumentError> {
		self.0.read_back(handle)
	}
}

#[test]
fn test_strict_identity_reports_silently_changed_handle() {
	let mut doc = LyingDocument(MemoryDocument::new());
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();

	let err = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap_err();

	let EntityError::IdentityNotPreserved { requested, issued } = err else {
		panic!("expected identity error, got {err:?}");
	};
	assert_eq!(requested, handle);
	let issued = issued.expect("document issued a handle");
	assert_ne!(issued, handle);
	// The new registration is still tracked so commit can release it.
	assert_eq!(entity.handle(), Some(issued));
	assert_eq!(entity.commit_edit(&mut doc).unwrap(), CommitOutcome::Committed);
	assert!(doc.0.is_empty());
}

#[test]
fn test_adopt_identity_accepts_new_handle() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Adopt).unwrap();
	doc.set_preserve_identity(false);

	let issued = entity.enter_edit(&mut doc, IdentityPolicy::Adopt).unwrap();

	assert_ne!(issued, handle);
	assert_eq!(entity.handle(), Some(issued));
	assert_eq!(doc.len(), 1);
}

#[test]
fn test_commit_edit_reads_back_and_releases() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.user_edit(handle, mesh("meshA'"));

	let outcome = entity.commit_edit(&mut doc).unwrap();

	assert_eq!(outcome, CommitOutcome::Committed);
	assert_eq!(entity.payload(), "meshA'");
	assert_eq!(entity.state(), EntityState::Detached);
	assert!(doc.is_empty());
}

#[test]
fn test_commit_edit_on_detached_is_noop() {
	let mut doc = MemoryDocument::<String>::new();
	let mut entity = EditableEntity::new(mesh("meshA"));

	let outcome = entity.commit_edit(&mut doc).unwrap();

	assert_eq!(outcome, CommitOutcome::NotLive);
	assert_eq!(entity.payload(), "meshA");
	assert_eq!(doc.mutation_count(), 0);
}

#[test]
fn test_commit_edit_with_missing_handle_keeps_payload() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshB"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.user_delete(handle);

	let outcome = entity.commit_edit(&mut doc).unwrap();

	assert_eq!(outcome, CommitOutcome::HandleMissing);
	assert_eq!(entity.payload(), "meshB");
	assert!(!entity.is_live());
}

/// Reports deleted objects as an error instead of an empty read.
struct ErroringReadDocument(MemoryDocument<String>);

impl MutableDocument<String> for ErroringReadDocument {
	fn add(&mut self, payload: &String) -> Result<Handle, DocumentError> {
		self.0.add(payload)
	}

	fn replace(&mut self, handle: Handle, payload: &String) -> Result<Handle, DocumentError> {
		self.0.replace(handle, payload)
	}

	fn remove(&mut self, handle: Handle) -> Result<(), DocumentError> {
		self.0.remove(handle)
	}

	fn read_back(&self, handle: Handle) -> Result<Option<String>, DocumentError> {
		match self.0.read_back(handle)? {
			Some(value) => Ok(Some(value)),
			None => Err(DocumentError::HandleNotFound(handle)),
		}
	}
}

#[test]
fn test_commit_edit_treats_handle_not_found_as_missing() {
	let mut doc = ErroringReadDocument(MemoryDocument::new());
	let mut entity = EditableEntity::new(mesh("meshB"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.0.user_delete(handle);

	let outcome = entity.commit_edit(&mut doc).unwrap();

	assert_eq!(outcome, CommitOutcome::HandleMissing);
	assert_eq!(entity.payload(), "meshB");
	assert_eq!(entity.state(), EntityState::Detached);
	assert_eq!(entity.commit_edit(&mut doc).unwrap(), CommitOutcome::NotLive);
}

#[test]
fn test_set_payload_replaces_detached_value() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));

	entity.set_payload(mesh("meshC"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();

	assert_eq!(entity.payload(), "meshC");
	assert_eq!(doc.get(handle).map(String::as_str), Some("meshC"));
}

#[test]
fn test_set_payload_on_live_entity_leaves_document_alone() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	let before = doc.mutation_count();

	entity.set_payload(mesh("meshC"));

	assert_eq!(doc.mutation_count(), before);
	assert_eq!(doc.get(handle).map(String::as_str), Some("meshA"));
	// Re-entering pushes the new value under the same handle.
	entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	assert_eq!(doc.get(handle).map(String::as_str), Some("meshC"));
}

#[test]
fn test_unavailable_wins_over_identity_refusal() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.set_preserve_identity(false);
	doc.set_available(false);

	let err = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap_err();

	assert!(matches!(err, EntityError::DocumentUnavailable(_)));
	assert_eq!(entity.state(), EntityState::Live(handle));
}

#[test]
fn test_unavailable_document_leaves_entity_unchanged() {
	let mut doc = MemoryDocument::new();
	let mut entity = EditableEntity::new(mesh("meshA"));
	doc.set_available(false);

	let err = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap_err();
	assert!(matches!(err, EntityError::DocumentUnavailable(_)));
	assert_eq!(entity.state(), EntityState::Detached);

	doc.set_available(true);
	let handle = entity.enter_edit(&mut doc, IdentityPolicy::Strict).unwrap();
	doc.user_edit(handle, mesh("meshA'"));
	doc.set_available(false);

	let err = entity.commit_edit(&mut doc).unwrap_err();
	assert!(matches!(err, EntityError::DocumentUnavailable(_)));
	assert_eq!(entity.state(), EntityState::Live(handle));
	assert_eq!(entity.payload(), "meshA");
}

#[test]
fn test_works_through_trait_object() {
	let mut doc = MemoryDocument::new();
	let dyn_doc: &mut dyn MutableDocument<String> = &mut doc;
	let mut entity = EditableEntity::new(mesh("meshA"));

	entity.enter_edit(dyn_doc, IdentityPolicy::Strict).unwrap();
	assert_eq!(entity.commit_edit(dyn_doc).unwrap(), CommitOutcome::Committed);
}
