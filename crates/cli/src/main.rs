//! geoedit command-line driver.
//!
//! Replays scripted consumer invocations against an in-memory host document
//! and inspects persisted session records.

mod cli;
mod runner;
mod script;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use geoedit_session::SessionConfig;
use runner::Runner;
use script::Script;
use tracing::info;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let config = match &cli.config {
		Some(path) => SessionConfig::load(path)
			.with_context(|| format!("failed to load config {}", path.display()))?,
		None => SessionConfig::default(),
	};

	match cli.command {
		Command::Run { script, save } => run(&script, save, config),
		Command::Inspect { record } => {
			let inspection = runner::inspect(&record)?;
			println!("edit mode: {}", inspection.editing);
			println!(
				"entities: {}",
				inspection.payloads.len() + inspection.failures.len()
			);
			for (index, payload) in inspection.payloads.iter().enumerate() {
				println!("  [{index}] {payload}");
			}
			for failure in &inspection.failures {
				eprintln!("  ! {failure}");
			}
			Ok(())
		}
	}
}

fn run(path: &Path, save: Option<PathBuf>, config: SessionConfig) -> anyhow::Result<()> {
	let script = Script::load(path)?;
	info!(steps = script.steps.len(), script = %path.display(), "running script");

	let mut runner = Runner::new(config);
	for (number, step) in script.steps.iter().enumerate() {
		let report = runner
			.run_step(step)
			.with_context(|| format!("step {} ({}) failed", number + 1, step.name()))?;
		let label = report.status.map(|s| format!(" ({s})")).unwrap_or_default();
		println!(
			"{:>3} {:<11} [{}]{label}",
			number + 1,
			step.name(),
			report.payloads.join(", ")
		);
		for note in &report.notes {
			println!("      ! {note}");
		}
	}

	if let Some(save) = save {
		runner.save(&save)?;
	}

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("geoedit_cli=debug,geoedit_session=trace,info")
			} else {
				EnvFilter::new("geoedit_cli=info,geoedit_session=info,warn")
			}
		})
	};

	// GEOEDIT_LOG_DIR keeps stdout clean for the step listing
	if let Some(log_dir) = std::env::var("GEOEDIT_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("geoedit.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter())
				.with(file_layer)
				.init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
