use angepkg::prelude::ArchiveKey;

use super::{CliError, CommandTrait};
use crate::keys::key_names;

// 256 bits unless asked otherwise
const DEFAULT_KEY_BITS: usize = 256;
pub const VERSION: &str = "0.1.0";

/// This command generates a random key, printed as hex
pub struct Evaluator;

impl CommandTrait for Evaluator {
	fn evaluate(&self, args: &clap::ArgMatches) -> anyhow::Result<()> {
		let bits = match args.value_of(key_names::BITS) {
			Some(bits) => bits
				.parse::<usize>()
				.map_err(|_| CliError::Usage(format!("--bits expects 128, 192 or 256, got: {}", bits)))?,
			None => DEFAULT_KEY_BITS,
		};

		let key = ArchiveKey::generate(bits).map_err(|err| CliError::Usage(err.to_string()))?;
		println!("{}", key.to_hex());

		Ok(())
	}
}
