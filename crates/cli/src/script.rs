//! Step scripts for the runner.
//!
//! ```toml
//! [[step]]
//! action = "invoke"
//! inputs = ["meshA", "meshB"]
//!
//! [[step]]
//! action = "toggle"
//!
//! [[step]]
//! action = "user_edit"
//! index = 0
//! value = "meshA'"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// A parsed script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
	/// Steps in execution order.
	#[serde(default, rename = "step")]
	pub steps: Vec<Step>,
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
	/// Consumer invocation with an input batch and flush flag.
	Invoke {
		#[serde(default)]
		inputs: Vec<String>,
		#[serde(default)]
		flush: bool,
	},
	/// Menu toggle followed by a recompute.
	Toggle {
		#[serde(default)]
		inputs: Vec<String>,
	},
	/// Apply an explicit edit flag.
	SetMode { editing: bool },
	/// Reshape the live object of an entity, as a user in the host would.
	UserEdit { index: usize, value: String },
	/// Delete the live object of an entity from the host.
	UserDelete { index: usize },
	/// Take the host document offline or bring it back.
	Document { available: bool },
	/// Persist the session to a record file.
	Save { path: PathBuf },
	/// Replace the session with a record file.
	Restore { path: PathBuf },
}

impl Step {
	/// Action name as written in scripts.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Invoke { .. } => "invoke",
			Self::Toggle { .. } => "toggle",
			Self::SetMode { .. } => "set_mode",
			Self::UserEdit { .. } => "user_edit",
			Self::UserDelete { .. } => "user_delete",
			Self::Document { .. } => "document",
			Self::Save { .. } => "save",
			Self::Restore { .. } => "restore",
		}
	}
}

impl Script {
	/// Parses a script from TOML.
	pub fn parse(input: &str) -> anyhow::Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Reads and parses a script file.
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let input = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read script {}", path.display()))?;
		Self::parse(&input).with_context(|| format!("invalid script {}", path.display()))
	}
}
