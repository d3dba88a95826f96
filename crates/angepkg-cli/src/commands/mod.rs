use std::collections::HashMap;

use angepkg::prelude::ArchiveKey;
use clap::ArgMatches;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::keys::key_names;

// A common progress bar style for all commands
const PROGRESS_BAR_STYLE: &str = "[{elapsed_precise}] {wide_bar} {pos:>7}/{len:7} ETA {eta_precise} {msg}";

// Trait that must be implemented by all subcommands
pub trait CommandTrait: Sync {
	fn evaluate(&self, args: &ArgMatches) -> Result<()>;
}

/// Failures that map onto a dedicated process exit code, anything else exits with 99
#[derive(Debug, thiserror::Error)]
pub enum CliError {
	#[error("{0}")]
	Usage(String),
	#[error("Key must be hex and 16/24/32 bytes long (AES-128/192/256): {0}")]
	BadKey(String),
	#[error("Encryption requested but no --key provided")]
	EncryptWithoutKey,
}

/// Exit code for a failed subcommand
pub fn exit_code(command: &str, err: &anyhow::Error) -> i32 {
	match err.downcast_ref::<CliError>() {
		Some(CliError::Usage(_)) => 1,
		Some(CliError::BadKey(_)) if command == "pack" => 2,
		Some(CliError::BadKey(_)) => 1,
		Some(CliError::EncryptWithoutKey) => 3,
		None => 99,
	}
}

// Parses the optional --key argument
pub(crate) fn read_key(args: &ArgMatches) -> Result<Option<ArchiveKey>, CliError> {
	match args.value_of(key_names::KEY) {
		Some(hex) => ArchiveKey::from_hex(hex)
			.map(Some)
			.map_err(|err| CliError::BadKey(err.to_string())),
		None => Ok(None),
	}
}

// Parses --jobs, falling back to the number of CPUs
pub(crate) fn read_jobs(args: &ArgMatches) -> Result<usize, CliError> {
	match args.value_of(key_names::JOBS) {
		Some(jobs) => match jobs.parse::<usize>() {
			Ok(jobs) if jobs > 0 => Ok(jobs),
			_ => Err(CliError::Usage(format!("--jobs expects a positive number, got: {}", jobs))),
		},
		None => Ok(num_cpus::get()),
	}
}

pub(crate) fn progress_bar(len: u64) -> Result<ProgressBar> {
	let pbar = ProgressBar::new(len);
	pbar.set_style(
		ProgressStyle::default_bar()
			.template(PROGRESS_BAR_STYLE)?
			.progress_chars("█░-"),
	);

	Ok(pbar)
}

// All sub-commands are defined in the below modules
pub mod keygen;
pub mod list;
pub mod pack;
pub mod pipe;
pub mod unpack;
pub mod verify;

pub fn build_commands() -> HashMap<&'static str, Box<dyn CommandTrait>> {
	let mut map: HashMap<&'static str, Box<dyn CommandTrait>> = HashMap::new();

	map.insert("pack", Box::new(pack::Evaluator));
	map.insert("list", Box::new(list::Evaluator));
	map.insert("unpack", Box::new(unpack::Evaluator));
	map.insert("pipe", Box::new(pipe::Evaluator));
	map.insert("verify", Box::new(verify::Evaluator));
	map.insert("keygen", Box::new(keygen::Evaluator));

	map
}
