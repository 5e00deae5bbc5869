//! Session configuration.
//!
//! Loaded from TOML. Every field has a default so an empty file (or no file)
//! yields the stale-snapshot, strict-identity, unbounded behavior.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What gets persisted for an entity that is live at serialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotPolicy {
	/// Persist the last payload synced back by a commit.
	#[default]
	LastSynced,
	/// Read the live value from the document first, falling back to the
	/// last synced payload if the read fails.
	ReadBackLive,
}

/// How a changed handle on re-registration is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityPolicy {
	/// A changed handle is a hard error.
	#[default]
	Strict,
	/// Track the new handle and log a warning.
	Adopt,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The config file could not be read.
	#[error("failed to read config {}: {source}", .path.display())]
	Io {
		/// Path that was read.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},
	/// The TOML is malformed or has unknown fields.
	#[error("invalid config: {0}")]
	Parse(#[from] toml::de::Error),
	/// `max_entities` was set to zero.
	#[error("max_entities must be at least 1")]
	ZeroEntityLimit,
}

/// Tunables for an [`EditSession`](crate::EditSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
	/// Upper bound on the size of a populating batch. `None` is unbounded.
	pub max_entities: Option<usize>,
	/// Snapshot behavior for live entities.
	pub snapshot_policy: SnapshotPolicy,
	/// Re-registration identity behavior.
	pub identity_policy: IdentityPolicy,
}

impl SessionConfig {
	/// Configuration for the single-entity variant.
	pub fn single() -> Self {
		Self {
			max_entities: Some(1),
			..Self::default()
		}
	}

	/// Parses a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&input)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.max_entities == Some(0) {
			return Err(ConfigError::ZeroEntityLimit);
		}
		Ok(())
	}
}
