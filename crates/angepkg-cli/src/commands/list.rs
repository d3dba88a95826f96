use tabled::{
	Table, Tabled,
	settings::{*, object::Columns},
};
use angepkg::prelude::{Archive, InternalError};
use indicatif::HumanBytes;

use super::CommandTrait;
use crate::keys::key_names;

pub const VERSION: &str = "0.1.0";

/// This command lists the entries in an archive in tabulated form
pub struct Evaluator;

impl CommandTrait for Evaluator {
	fn evaluate(&self, args: &clap::ArgMatches) -> anyhow::Result<()> {
		let archive_path = match args.value_of(key_names::INPUT) {
			Some(path) => path,
			None => return Err(super::CliError::Usage("Please provide an input archive file".to_string()).into()),
		};

		let key = super::read_key(args)?;

		let archive = match Archive::open(archive_path, key.as_ref()) {
			Ok(archive) => archive,
			Err(InternalError::MissingKey) => {
				anyhow::bail!("The manifest of {} is encrypted, please provide a key with --key", archive_path)
			},
			Err(err) => anyhow::bail!("Unable to open {}: {}", archive_path, err),
		};

		// log basic metadata
		println!("{}", archive);

		let mut entries: Vec<_> = archive.entries().iter().collect();

		// Sort the entries accordingly
		match args.value_of(key_names::SORT) {
			Some("alphabetical") => entries.sort_by(|a, b| a.path.cmp(&b.path)),
			Some("alphabetical-reversed") => entries.sort_by(|a, b| b.path.cmp(&a.path)),
			Some("size-ascending") => entries.sort_by(|a, b| a.length.cmp(&b.length)),
			Some("size-descending") => entries.sort_by(|a, b| b.length.cmp(&a.length)),
			Some(sort) => {
				return Err(super::CliError::Usage(format!(
					"Unknown sort option provided: {}. Valid sort types are: 'alphabetical' 'alphabetical-reversed' 'size-ascending' 'size-descending'",
					sort
				))
				.into())
			},
			_ => (),
		};

		let table_entries: Vec<FileTableEntry> = entries
			.into_iter()
			.map(|entry| FileTableEntry {
				path: &entry.path,
				offset: entry.offset,
				size: HumanBytes(entry.length).to_string(),
				compressed: if entry.compressed { "gzip" } else { "-" },
				encrypted: if entry.encrypted { "AES-GCM" } else { "-" },
			})
			.collect();

		let mut table = Table::new(table_entries);
		table
			.with(Style::rounded())
			.with(Modify::list(Columns::new(..1), Alignment::left()));

		println!("{}", table);

		Ok(())
	}
}

#[derive(Tabled)]
struct FileTableEntry<'a> {
	path: &'a str,
	offset: u64,
	size: String,
	compressed: &'static str,
	encrypted: &'static str,
}
