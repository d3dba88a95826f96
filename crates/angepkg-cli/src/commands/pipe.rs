use std::io::{self, Write};

use angepkg::prelude::*;

use super::CommandTrait;
use crate::keys::key_names;

pub const VERSION: &str = "0.1.0";

/// This command writes one decoded entry to stdout
pub struct Evaluator;

impl CommandTrait for Evaluator {
	fn evaluate(&self, args: &clap::ArgMatches) -> anyhow::Result<()> {
		let (input_path, resource) = match (args.value_of(key_names::INPUT), args.value_of(key_names::RESOURCE)) {
			(Some(input), Some(resource)) => (input, resource),
			_ => return Err(super::CliError::Usage("Please provide an archive and an entry path".to_string()).into()),
		};

		let key = super::read_key(args)?;

		// Parse then extract archive
		let mut archive = match Archive::open(input_path, key.as_ref()) {
			Ok(archive) => archive,
			Err(err) => match err {
				InternalError::MissingKey => {
					anyhow::bail!("Please provide a key with --key, the archive's manifest is encrypted")
				},
				InternalError::MalformedArchiveSource(_) => anyhow::bail!("Unable to validate the archive: {}", err),
				err => anyhow::bail!("Encountered an error: {}", err),
			},
		};

		let mut resource = archive.fetch_mut(resource)?;

		let stdout = io::stdout();
		{
			let mut handle = stdout.lock();
			io::copy(&mut resource, &mut handle)?;
			handle.flush()?;
		}

		Ok(())
	}
}
