//! Executes scripts against a [`MemoryDocument`].

use std::path::Path;

use anyhow::{Context, anyhow};
use geoedit_session::{
	EditSession, Handle, Invocation, MemoryDocument, ModeReport, PostcardCodec, RestoreReport,
	SessionConfig, SessionRecord,
};
use tracing::{debug, info};

use crate::script::Step;

/// What a step surfaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
	/// Payloads surfaced to the consumer, in entity order.
	pub payloads: Vec<String>,
	/// Status label after the step.
	pub status: Option<&'static str>,
	/// Non-fatal conditions worth showing.
	pub notes: Vec<String>,
}

/// Session, document and codec driven by a script.
#[derive(Debug)]
pub struct Runner {
	session: EditSession<String>,
	doc: MemoryDocument<String>,
	codec: PostcardCodec<String>,
}

impl Runner {
	/// Creates a runner with an empty session and document.
	pub fn new(config: SessionConfig) -> Self {
		Self {
			session: EditSession::new(config),
			doc: MemoryDocument::new(),
			codec: PostcardCodec::new(),
		}
	}

	/// The driven session.
	pub fn session(&self) -> &EditSession<String> {
		&self.session
	}

	/// The simulated host document.
	pub fn document(&self) -> &MemoryDocument<String> {
		&self.doc
	}

	/// Executes one step.
	pub fn run_step(&mut self, step: &Step) -> anyhow::Result<StepReport> {
		debug!(action = step.name(), "running step");
		let mut notes = Vec::new();

		let payloads = match step {
			Step::Invoke { inputs, flush } => {
				let invocation = self.session.invoke(&mut self.doc, inputs.clone(), *flush)?;
				describe_invocation(invocation, &mut notes)
			}
			Step::Toggle { inputs } => {
				let invocation = self
					.session
					.toggle_mode_and_recompute(&mut self.doc, inputs.clone())?;
				describe_invocation(invocation, &mut notes)
			}
			Step::SetMode { editing } => {
				let report = self.session.set_mode(&mut self.doc, *editing);
				describe_mode(report, &mut notes)
			}
			Step::UserEdit { index, value } => {
				let handle = self.live_handle(*index)?;
				self.doc.user_edit(handle, value.clone());
				self.session.payloads()
			}
			Step::UserDelete { index } => {
				let handle = self.live_handle(*index)?;
				self.doc.user_delete(handle);
				self.session.payloads()
			}
			Step::Document { available } => {
				self.doc.set_available(*available);
				self.session.payloads()
			}
			Step::Save { path } => {
				self.save(path)?;
				notes.push(format!("saved {} entities to {}", self.session.len(), path.display()));
				self.session.payloads()
			}
			Step::Restore { path } => {
				let report = self.restore(path)?;
				notes.extend(report.failures.iter().map(ToString::to_string));
				self.session.payloads()
			}
		};

		Ok(StepReport {
			payloads,
			status: self.session.status_label(),
			notes,
		})
	}

	/// Writes the session to a record file, honoring the snapshot policy.
	pub fn save(&self, path: &Path) -> anyhow::Result<()> {
		let record = self.session.serialize_with(&self.doc, &self.codec)?;
		let bytes = record.to_bytes()?;
		std::fs::write(path, bytes)
			.with_context(|| format!("failed to write record {}", path.display()))?;
		info!(path = %path.display(), entities = self.session.len(), "session saved");
		Ok(())
	}

	fn restore(&mut self, path: &Path) -> anyhow::Result<RestoreReport> {
		let record = read_record(path)?;
		let report = self.session.restore(&record, &self.codec)?;
		info!(
			path = %path.display(),
			restored = report.restored,
			dropped = report.failures.len(),
			"session restored"
		);
		Ok(report)
	}

	fn live_handle(&self, index: usize) -> anyhow::Result<Handle> {
		let entity = self
			.session
			.entities()
			.get(index)
			.ok_or_else(|| anyhow!("no entity at index {index}"))?;
		entity
			.handle()
			.ok_or_else(|| anyhow!("entity {index} is not live"))
	}
}

/// Summary of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
	/// Persisted edit flag.
	pub editing: bool,
	/// Payloads that decoded, in order.
	pub payloads: Vec<String>,
	/// Entities that did not decode.
	pub failures: Vec<String>,
}

/// Reads a record file and decodes every payload it holds.
pub fn inspect(path: &Path) -> anyhow::Result<Inspection> {
	let record = read_record(path)?;
	let mut session = EditSession::<String>::default();
	let report = session.restore(&record, &PostcardCodec::new())?;
	Ok(Inspection {
		editing: session.mode(),
		payloads: session.payloads(),
		failures: report.failures.iter().map(ToString::to_string).collect(),
	})
}

fn read_record(path: &Path) -> anyhow::Result<SessionRecord> {
	let bytes =
		std::fs::read(path).with_context(|| format!("failed to read record {}", path.display()))?;
	SessionRecord::from_bytes(&bytes).with_context(|| format!("invalid record {}", path.display()))
}

fn describe_invocation(invocation: Invocation<String>, notes: &mut Vec<String>) -> Vec<String> {
	match invocation {
		Invocation::Flushed { discarded } => {
			notes.push(format!("flushed {discarded} entities"));
			Vec::new()
		}
		Invocation::Applied(report) => describe_mode(report, notes),
	}
}

fn describe_mode(report: ModeReport<String>, notes: &mut Vec<String>) -> Vec<String> {
	notes.extend(report.failures.iter().map(ToString::to_string));
	notes.extend(
		report
			.missing
			.iter()
			.map(|index| format!("entity {index}: live object was deleted, kept last payload")),
	);
	report.payloads
}
