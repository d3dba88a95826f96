use std::{num::NonZeroUsize, path::Path, time::Duration};

use angepkg::builder::{pack_directory, BuilderConfig};
use indicatif::{HumanBytes, ProgressBar};
use log::info;

use super::{CliError, CommandTrait};
use crate::keys::key_names;

pub const VERSION: &str = "0.1.0";

/// This command packs a directory tree into an archive
pub struct Evaluator;

impl CommandTrait for Evaluator {
	fn evaluate(&self, args: &clap::ArgMatches) -> anyhow::Result<()> {
		let (input, output) = match (args.value_of(key_names::INPUT), args.value_of(key_names::DESTINATION)) {
			(Some(input), Some(output)) => (input, output),
			_ => {
				return Err(CliError::Usage(
					"Usage: angepkg pack <inputDir> <outputFile> [--key <hex>] [--compress] [--encrypt]".to_string(),
				)
				.into())
			},
		};

		// The key is validated before anything else, a bad key is its own failure
		let key = super::read_key(args)?;

		let compress = args.is_present(key_names::COMPRESS);
		let encrypt = args.is_present(key_names::ENCRYPT);

		if encrypt && key.is_none() {
			return Err(CliError::EncryptWithoutKey.into());
		}

		let jobs = super::read_jobs(args)?;

		let mut config = BuilderConfig::default().compress(compress).encrypt(encrypt);
		if let Some(key) = key {
			config = config.key(key);
		}

		if let Some(jobs) = NonZeroUsize::new(jobs) {
			config = config.threads(jobs);
		}

		info!(
			"Packing {} into {} (compress: {}, encrypt: {})",
			input, output, compress, encrypt
		);

		let spinner = ProgressBar::new_spinner();
		spinner.set_message(format!("Packing {}", Path::new(input).display()));
		spinner.enable_steady_tick(Duration::from_millis(80));

		let result = pack_directory(input, output, &config);
		spinner.finish_and_clear();

		let bytes_written = result?;
		println!(
			"Packed successfully to: {}; Bytes written: {}",
			output,
			HumanBytes(bytes_written)
		);

		Ok(())
	}
}
