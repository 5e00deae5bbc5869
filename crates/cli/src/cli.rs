use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "geoedit")]
#[command(about = "Replay edit sessions against an in-memory document")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Session config file (TOML)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run a step script and print the surfaced payloads after each step
	Run {
		/// Script file (TOML)
		script: PathBuf,

		/// Persist the final session to this record file
		#[arg(long, value_name = "PATH")]
		save: Option<PathBuf>,
	},
	/// Print the contents of a persisted record
	Inspect {
		/// Record file written by `save`
		record: PathBuf,
	},
}
