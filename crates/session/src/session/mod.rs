//! Batch edit session.
//!
//! The [`EditSession`] caches an ordered batch of [`EditableEntity`] values
//! across invocations until it is flushed. Every invocation applies the
//! global edit flag uniformly: entering edit registers each payload with the
//! document, leaving it reads each live value back. Entities are processed
//! independently, so a failure on one leaves the batch in a mixed state that
//! the next invocation resolves per entity.
//!
//! Order is the only identity that survives persistence. Handles are dropped
//! by [`serialize`](EditSession::serialize) and every restored entity starts
//! detached.

use tracing::{debug, trace, warn};

use crate::codec::{CodecError, PayloadCodec};
use crate::config::{SessionConfig, SnapshotPolicy};
use crate::document::MutableDocument;
use crate::entity::{CommitOutcome, EditableEntity, EntityError};
use crate::record::{
	KEY_EDIT_MODE, KEY_ENTITY_COUNT, KEY_VERSION, RECORD_VERSION, RecordError, RecordValue,
	SessionRecord, entity_key,
};


/// Status label shown while the session is in edit mode.
pub const EDIT_MODE_LABEL: &str = "Edit mode";

/// Batch-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
	/// A populating batch exceeds [`SessionConfig::max_entities`].
	#[error("batch of {len} payloads exceeds the limit of {limit}")]
	BatchTooLarge {
		/// Size of the rejected batch.
		len: usize,
		/// Configured limit.
		limit: usize,
	},
	/// A payload could not be encoded for persistence.
	#[error("failed to encode entity {index}: {source}")]
	Encode {
		/// Entity index.
		index: usize,
		/// Codec failure.
		#[source]
		source: CodecError,
	},
	/// The persisted record is structurally invalid.
	#[error(transparent)]
	Record(#[from] RecordError),
	/// One or more entities failed to change mode.
	#[error("{} entities failed to change mode", .failures.len())]
	Transition {
		/// Per-entity failures in index order.
		failures: Vec<EntityFailure>,
	},
}

/// Transition failure of one entity within a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entity {index}: {error}")]
pub struct EntityFailure {
	/// Entity index.
	pub index: usize,
	/// What went wrong.
	#[source]
	pub error: EntityError,
}

/// Outcome of applying the edit flag to every entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeReport<P> {
	/// Flag that was applied.
	pub editing: bool,
	/// Best-known payload of every entity, in order, after the transition.
	pub payloads: Vec<P>,
	/// Entities that failed to transition.
	pub failures: Vec<EntityFailure>,
	/// Entities whose live object had been deleted outside the session.
	pub missing: Vec<usize>,
}

impl<P> ModeReport<P> {
	/// Returns true if every entity transitioned.
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}

	/// Converts into the payload list, or the aggregated failures.
	pub fn into_result(self) -> Result<Vec<P>, SessionError> {
		if self.failures.is_empty() {
			Ok(self.payloads)
		} else {
			Err(SessionError::Transition {
				failures: self.failures,
			})
		}
	}
}

/// Outcome of one [`EditSession::invoke`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<P> {
	/// The cache was flushed; nothing is surfaced.
	Flushed {
		/// Number of entities discarded.
		discarded: usize,
	},
	/// The current mode was applied.
	Applied(ModeReport<P>),
}

impl<P> Invocation<P> {
	/// Payloads surfaced to the consumer.
	pub fn payloads(&self) -> &[P] {
		match self {
			Self::Flushed { .. } => &[],
			Self::Applied(report) => &report.payloads,
		}
	}
}

/// An entity dropped during restore.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entity {index} not restored: {error}")]
pub struct RestoreFailure {
	/// Index in the record.
	pub index: usize,
	/// Decode failure.
	#[source]
	pub error: CodecError,
}

/// Outcome of [`EditSession::restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
	/// Number of entities rebuilt.
	pub restored: usize,
	/// Entities dropped because their payload did not decode.
	pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
	/// Returns true if any entity was dropped.
	pub fn is_partial(&self) -> bool {
		!self.failures.is_empty()
	}
}

/// Ordered cache of editable entities for one logical invocation site.
#[derive(Debug, Clone)]
pub struct EditSession<P> {
	entities: Vec<EditableEntity<P>>,
	mode: bool,
	config: SessionConfig,
}

impl<P: Clone> Default for EditSession<P> {
	fn default() -> Self {
		Self::new(SessionConfig::default())
	}
}

impl<P: Clone> EditSession<P> {
	/// Creates an empty session in non-edit mode.
	pub fn new(config: SessionConfig) -> Self {
		Self {
			entities: Vec::new(),
			mode: false,
			config,
		}
	}

	/// Creates an empty single-entity session.
	pub fn single() -> Self {
		Self::new(SessionConfig::single())
	}

	/// Session configuration.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Global edit flag.
	pub fn mode(&self) -> bool {
		self.mode
	}

	/// `"Edit mode"` while the edit flag is set.
	pub fn status_label(&self) -> Option<&'static str> {
		self.mode.then_some(EDIT_MODE_LABEL)
	}

	/// Number of cached entities.
	pub fn len(&self) -> usize {
		self.entities.len()
	}

	/// Returns true if nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// Cached entities in order.
	pub fn entities(&self) -> &[EditableEntity<P>] {
		&self.entities
	}

	/// Number of entities currently registered with a document.
	pub fn live_count(&self) -> usize {
		self.entities.iter().filter(|e| e.is_live()).count()
	}

	/// Best-known payload of every entity, in order.
	pub fn payloads(&self) -> Vec<P> {
		self.entities.iter().map(|e| e.payload().clone()).collect()
	}

	/// Fills an empty session with one detached entity per payload.
	///
	/// Does nothing while the session already holds entities. Returns the
	/// number of entities created.
	pub fn populate<I>(&mut self, payloads: I) -> Result<usize, SessionError>
	where
		I: IntoIterator<Item = P>,
	{
		if !self.entities.is_empty() {
			trace!(cached = self.entities.len(), "populate: cache hit");
			return Ok(0);
		}

		let payloads: Vec<P> = payloads.into_iter().collect();
		if let Some(limit) = self.config.max_entities
			&& payloads.len() > limit
		{
			return Err(SessionError::BatchTooLarge {
				len: payloads.len(),
				limit,
			});
		}

		self.entities = payloads.into_iter().map(EditableEntity::new).collect();
		debug!(entities = self.entities.len(), "session populated");
		Ok(self.entities.len())
	}

	/// Sets the edit flag and applies it to every entity.
	///
	/// Entering edit registers (or re-registers) each payload; leaving it
	/// commits each live entity. All entities are attempted regardless of
	/// earlier failures.
	pub fn set_mode<D>(&mut self, doc: &mut D, editing: bool) -> ModeReport<P>
	where
		D: MutableDocument<P> + ?Sized,
	{
		self.mode = editing;
		let policy = self.config.identity_policy;
		let mut failures = Vec::new();
		let mut missing = Vec::new();

		for (index, entity) in self.entities.iter_mut().enumerate() {
			let result = if editing {
				entity.enter_edit(doc, policy).map(|_| ())
			} else {
				entity.commit_edit(doc).map(|outcome| {
					if outcome == CommitOutcome::HandleMissing {
						missing.push(index);
					}
				})
			};

			if let Err(error) = result {
				warn!(index, %error, editing, "entity failed to change mode");
				failures.push(EntityFailure { index, error });
			}
		}

		debug!(
			editing,
			entities = self.entities.len(),
			failures = failures.len(),
			missing = missing.len(),
			"mode applied"
		);

		ModeReport {
			editing,
			payloads: self.payloads(),
			failures,
			missing,
		}
	}

	/// Flips the edit flag without touching any entity. Returns the new flag.
	pub fn toggle_mode(&mut self) -> bool {
		self.mode = !self.mode;
		debug!(editing = self.mode, "mode toggled");
		self.mode
	}

	/// Discards every entity without committing.
	///
	/// Live registrations stay in the document; the session simply forgets
	/// them. Returns the number of entities discarded.
	pub fn flush(&mut self) -> usize {
		let discarded = self.entities.len();
		let orphaned = self.live_count();
		self.entities.clear();
		debug!(discarded, orphaned, "session flushed");
		discarded
	}

	/// One consumer invocation: populate if empty, then flush or apply the
	/// current mode.
	pub fn invoke<D, I>(
		&mut self,
		doc: &mut D,
		inputs: I,
		flush: bool,
	) -> Result<Invocation<P>, SessionError>
	where
		D: MutableDocument<P> + ?Sized,
		I: IntoIterator<Item = P>,
	{
		// A flush empties the session whatever the batch, so an oversized
		// batch is not an error there.
		if let Err(err) = self.populate(inputs) {
			if !flush {
				return Err(err);
			}
			debug!(%err, "flush: batch not cached");
		}

		if flush {
			let discarded = self.flush();
			return Ok(Invocation::Flushed { discarded });
		}

		Ok(Invocation::Applied(self.set_mode(doc, self.mode)))
	}

	/// Flips the edit flag and recomputes, as a menu toggle does.
	pub fn toggle_mode_and_recompute<D, I>(
		&mut self,
		doc: &mut D,
		inputs: I,
	) -> Result<Invocation<P>, SessionError>
	where
		D: MutableDocument<P> + ?Sized,
		I: IntoIterator<Item = P>,
	{
		self.toggle_mode();
		self.invoke(doc, inputs, false)
	}

	/// Builds a record from the last synced payloads.
	pub fn serialize<C>(&self, codec: &C) -> Result<SessionRecord, SessionError>
	where
		C: PayloadCodec<P> + ?Sized,
	{
		self.build_record(codec, |_, _| None)
	}

	/// Builds a record following [`SessionConfig::snapshot_policy`].
	///
	/// With [`SnapshotPolicy::ReadBackLive`] each live entity's current value
	/// is read from `doc` without releasing it; a failed or empty read falls
	/// back to the last synced payload.
	pub fn serialize_with<D, C>(
		&self,
		doc: &D,
		codec: &C,
	) -> Result<SessionRecord, SessionError>
	where
		D: MutableDocument<P> + ?Sized,
		C: PayloadCodec<P> + ?Sized,
	{
		match self.config.snapshot_policy {
			SnapshotPolicy::LastSynced => self.serialize(codec),
			SnapshotPolicy::ReadBackLive => self.build_record(codec, |index, entity| {
				let handle = entity.handle()?;
				match doc.read_back(handle) {
					Ok(Some(current)) => Some(current),
					Ok(None) => {
						warn!(index, %handle, "live object gone, persisting last synced payload");
						None
					}
					Err(error) => {
						warn!(index, %error, "read back failed, persisting last synced payload");
						None
					}
				}
			}),
		}
	}

	/// Replaces the whole session with the contents of `record`.
	///
	/// Structural problems reject the record and leave the session
	/// untouched. Entities whose payload does not decode are dropped and
	/// reported; the rest are restored detached, in order.
	pub fn restore<C>(
		&mut self,
		record: &SessionRecord,
		codec: &C,
	) -> Result<RestoreReport, SessionError>
	where
		C: PayloadCodec<P> + ?Sized,
	{
		let header = record.header()?;
		let mut entities = Vec::with_capacity(header.entity_count);
		let mut failures = Vec::new();

		for index in 0..header.entity_count {
			let bytes = record.get_bytes(&entity_key(index))?;
			match codec.decode(bytes) {
				Ok(payload) => entities.push(EditableEntity::new(payload)),
				Err(error) => {
					warn!(index, %error, "dropping undecodable entity");
					failures.push(RestoreFailure { index, error });
				}
			}
		}

		let orphaned = self.live_count();
		self.entities = entities;
		self.mode = header.edit_mode;
		debug!(
			editing = self.mode,
			restored = self.entities.len(),
			dropped = failures.len(),
			orphaned,
			"session restored"
		);

		Ok(RestoreReport {
			restored: self.entities.len(),
			failures,
		})
	}

	fn build_record<C, F>(
		&self,
		codec: &C,
		mut live_value: F,
	) -> Result<SessionRecord, SessionError>
	where
		C: PayloadCodec<P> + ?Sized,
		F: FnMut(usize, &EditableEntity<P>) -> Option<P>,
	{
		let mut record = SessionRecord::new();
		record.set(KEY_VERSION, RecordValue::Int(RECORD_VERSION));
		record.set(KEY_EDIT_MODE, RecordValue::Bool(self.mode));
		record.set(
			KEY_ENTITY_COUNT,
			RecordValue::Int(self.entities.len() as i64),
		);

		for (index, entity) in self.entities.iter().enumerate() {
			let live = live_value(index, entity);
			let payload = live.as_ref().unwrap_or(entity.payload());
			let bytes = codec
				.encode(payload)
				.map_err(|source| SessionError::Encode { index, source })?;
			record.set(entity_key(index), RecordValue::Bytes(bytes));
		}

		trace!(entities = self.entities.len(), "session serialized");
		Ok(record)
	}
}
