use angepkg::archive::*;
use log::{error, info};

use super::CommandTrait;
use crate::keys::key_names;

pub const VERSION: &str = "0.1.0";

/// This command verifies the validity and integrity of an archive
pub struct Evaluator;

impl CommandTrait for Evaluator {
	fn evaluate(&self, args: &clap::ArgMatches) -> anyhow::Result<()> {
		let input_path = match args.value_of(key_names::INPUT) {
			Some(path) => path,
			None => return Err(super::CliError::Usage("Please provide an input archive".to_string()).into()),
		};

		let key = super::read_key(args)?;

		let archive = match Archive::open(input_path, key.as_ref()) {
			Ok(archive) => archive,
			Err(err) => match err {
				InternalError::MalformedArchiveSource(m) => anyhow::bail!("Invalid Magic Sequence: {:?}", m),
				InternalError::IncompatibleArchiveVersion(v) => {
					anyhow::bail!("Incompatible Archive Version: {}, expected: {}", v, angepkg::VERSION)
				},
				InternalError::MissingKey => anyhow::bail!("The manifest is encrypted, please provide a key with --key"),
				e => anyhow::bail!("Unable to verify the archive source, error: {}", e),
			},
		};

		// Decode every entry, authenticating and decompressing as stored
		let pbar = super::progress_bar(archive.entries().len() as u64)?;
		let mut failures = 0;

		for entry in archive.entries() {
			pbar.set_message(entry.path.clone());

			if let Err(err) = archive.open_stream(entry) {
				pbar.suspend(|| error!("{}: {}", entry.path, err));
				failures += 1;
			}

			pbar.inc(1);
		}

		pbar.finish_and_clear();

		if failures > 0 {
			anyhow::bail!("{} of {} entries failed verification", failures, archive.entries().len());
		}

		info!("{}", archive);
		println!("Verified {} entries in {}", archive.entries().len(), input_path);

		Ok(())
	}
}
