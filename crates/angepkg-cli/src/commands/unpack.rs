use std::{
	fs,
	io::{Read, Seek},
	path::{Component, Path, PathBuf},
	thread,
	time::Instant,
};

use angepkg::prelude::*;
use log::info;

use super::CommandTrait;
use crate::keys::key_names;

pub const VERSION: &str = "0.1.0";

/// This command extracts an archive into the specified output folder
pub struct Evaluator;

impl CommandTrait for Evaluator {
	fn evaluate(&self, args: &clap::ArgMatches) -> anyhow::Result<()> {
		let input_path = match args.value_of(key_names::INPUT) {
			Some(path) => path,
			None => return Err(super::CliError::Usage("Please provide an input archive".to_string()).into()),
		};

		let output_path = match args.value_of(key_names::OUTPUT) {
			Some(path) => PathBuf::from(path),
			None => PathBuf::from("."),
		};

		if output_path.is_file() {
			return Err(super::CliError::Usage("Please provide a directory|folder path as the value of -o | --output".to_string()).into());
		};

		let key = super::read_key(args)?;
		let jobs = super::read_jobs(args)?;

		// Parse then extract archive
		let archive = match Archive::open(input_path, key.as_ref()) {
			Ok(archive) => archive,
			Err(err) => match err {
				InternalError::MissingKey => {
					anyhow::bail!("Please provide a key with --key, the archive's manifest is encrypted")
				},
				InternalError::MalformedArchiveSource(_) => anyhow::bail!("Unable to validate the archive: {}", err),
				err => anyhow::bail!("Encountered an error: {}", err),
			},
		};

		extract_archive(&archive, jobs, &output_path)
	}
}

// Entry paths are relative, anything that climbs out of the target folder is refused
fn target_path(target_folder: &Path, entry_path: &str) -> anyhow::Result<PathBuf> {
	let relative = Path::new(entry_path);
	if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
		anyhow::bail!("Refusing to extract entry with a non-relative path: {}", entry_path);
	}

	Ok(target_folder.join(relative))
}

fn extract_archive<T: Read + Seek + Send>(archive: &Archive<T>, jobs: usize, target_folder: &Path) -> anyhow::Result<()> {
	// For measuring the time difference
	let time = Instant::now();
	fs::create_dir_all(target_folder)?;

	let total_size: u64 = archive.entries().iter().map(|entry| entry.length).sum();
	let pbar = super::progress_bar(total_size)?;

	// Extract all entries in parallel
	let entries = archive.entries();
	let chunk_size = entries.len().div_ceil(jobs).max(1);

	thread::scope(|s| -> anyhow::Result<()> {
		let handles = entries
			.chunks(chunk_size)
			.map(|chunk| {
				let pbar = pbar.clone();

				s.spawn(move || -> anyhow::Result<()> {
					for entry in chunk {
						// Set's the Progress Bar message
						pbar.set_message(entry.path.clone());

						let save_path = target_path(target_folder, &entry.path)?;
						let mut resource = archive.open_stream(entry)?;

						if let Some(parent_dir) = save_path.parent() {
							fs::create_dir_all(parent_dir)?;
						};

						let mut file = fs::File::create(&save_path)?;
						std::io::copy(&mut resource, &mut file)?;

						// Increment Progress Bar
						pbar.inc(entry.length);
					}

					Ok(())
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			match handle.join() {
				Ok(result) => result?,
				Err(_) => anyhow::bail!("An extraction thread panicked"),
			}
		}

		Ok(())
	})?;

	// Finished extracting
	pbar.finish();
	info!(
		"Extracted {} files in {}s",
		archive.entries().len(),
		time.elapsed().as_secs_f64()
	);

	Ok(())
}
