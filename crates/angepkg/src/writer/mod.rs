use std::{
	cmp::Ordering,
	fs::File,
	io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write},
	path::{Component, Path},
};

use log::{debug, info, warn};

mod config;
mod leaf;

pub use config::BuilderConfig;
pub use leaf::Leaf;

use leaf::{process_leaf, ProcessedLeaf};

use crate::crypto::{self, Cipher};
use crate::global::error::*;
use crate::global::{
	flags::Flags,
	header::Header,
	manifest::{self, lookup_key, Manifest, ManifestEntry},
};

/// How many times [`dump`] re-encodes the manifest while searching for a stable size
pub const MAX_LAYOUT_PASSES: usize = 4;

// Stands in for real offsets while the provisional manifest is measured
const PLACEHOLDER_OFFSET: u64 = 99_999_999;

/// This iterates over all [`Leaf`]s, processes them and writes the archive out into the target.
/// Leaves are sorted in place by path (case-insensitively), which is also the order of the payloads.
///
/// The manifest describes the absolute offsets of the payloads that come after it, so its size depends on its content.
/// Offsets are resolved by re-encoding until the size stops changing, see [`MAX_LAYOUT_PASSES`].
///
/// Returns the total number of bytes written.
pub fn dump<W: Write + Seek, R: Read + Send>(
	mut target: W, leaves: &mut [Leaf<R>], config: &BuilderConfig,
	mut callback: Option<&mut dyn FnMut(&ManifestEntry, &[u8])>,
) -> InternalResult<u64> {
	// Deterministic order, ties broken by the exact path
	leaves.sort_by(|a, b| match lookup_key(&a.path).cmp(&lookup_key(&b.path)) {
		Ordering::Equal => a.path.cmp(&b.path),
		ord => ord,
	});

	if let Some(pair) = leaves
		.windows(2)
		.find(|pair| lookup_key(&pair[0].path) == lookup_key(&pair[1].path))
	{
		return Err(InternalError::DuplicateEntryPath(pair[1].path.clone()));
	}

	let needs_key = config.encrypt || leaves.iter().any(|leaf| leaf.encrypt);
	let cipher = match (&config.key, needs_key) {
		(Some(key), _) => Some(key.cipher()),
		(None, true) => return Err(InternalError::MissingKey),
		(None, false) => None,
	};

	let processed = process_leaves(leaves, config, cipher.as_ref())?;

	// Header
	let mut flags = Flags::new();
	flags.force_set(Flags::MANIFEST_COMPRESSED, config.compress);
	flags.force_set(Flags::MANIFEST_ENCRYPTED, config.encrypt);

	let manifest_nonce = config.encrypt.then(crypto::random_nonce);
	let seal = match (&cipher, &manifest_nonce) {
		(Some(cipher), Some(nonce)) => Some((cipher, nonce)),
		_ => None,
	};

	let mut manifest = Manifest::new(processed.iter().map(|p| p.entry.clone()).collect());
	let header_size = Header::size_for(flags) as u64;

	let manifest_bytes = layout(&mut manifest, header_size, config.compress, seal)?;

	let header = Header {
		manifest_length: manifest_bytes.len() as i64,
		flags,
		manifest_nonce,
		..Header::default()
	};

	// Start at the very start of the target
	target.seek(SeekFrom::Start(0))?;
	target.write_all(&header.to_bytes())?;
	target.write_all(&manifest_bytes)?;

	let mut bytes_written = header.size() as u64 + manifest_bytes.len() as u64;

	for (leaf, entry) in processed.iter().zip(manifest.files.iter()) {
		debug_assert_eq!(bytes_written, entry.offset);
		target.write_all(&leaf.data)?;
		bytes_written += leaf.data.len() as u64;

		// Call the progress callback
		if let Some(callback) = callback.as_mut() {
			callback(entry, &leaf.data);
		}
	}

	target.flush()?;
	debug!(
		"Wrote {} entries, {} bytes, manifest: {} bytes, {}",
		manifest.files.len(),
		bytes_written,
		manifest_bytes.len(),
		flags
	);

	Ok(bytes_written)
}

#[cfg(not(feature = "multithreaded"))]
fn process_leaves<R: Read + Send>(
	leaves: &mut [Leaf<R>], config: &BuilderConfig, cipher: Option<&Cipher>,
) -> InternalResult<Vec<ProcessedLeaf>> {
	leaves
		.iter_mut()
		.map(|leaf| {
			let (compress, encrypt) = (leaf.compress || config.compress, leaf.encrypt || config.encrypt);
			process_leaf(leaf, compress, encrypt, cipher)
		})
		.collect()
}

#[cfg(feature = "multithreaded")]
fn process_leaves<R: Read + Send>(
	leaves: &mut [Leaf<R>], config: &BuilderConfig, cipher: Option<&Cipher>,
) -> InternalResult<Vec<ProcessedLeaf>> {
	use rayon::prelude::*;

	let mut builder = rayon::ThreadPoolBuilder::new();
	if let Some(threads) = config.num_threads {
		builder = builder.num_threads(threads.get());
	}

	let pool = builder.build().map_err(|err| InternalError::OtherError(err.into()))?;

	// collect keeps the input order
	pool.install(|| {
		leaves
			.par_iter_mut()
			.map(|leaf| {
				let (compress, encrypt) = (leaf.compress || config.compress, leaf.encrypt || config.encrypt);
				process_leaf(leaf, compress, encrypt, cipher)
			})
			.collect()
	})
}

// Temporary files are owner-only, archives keep the output's mode or get a regular file's
#[cfg(unix)]
fn archive_permissions(output: &Path) -> std::fs::Permissions {
	use std::os::unix::fs::PermissionsExt;

	match std::fs::metadata(output) {
		Ok(metadata) => metadata.permissions(),
		Err(_) => std::fs::Permissions::from_mode(0o644),
	}
}

// Assign offsets until the encoded manifest has the size the offsets were computed from
pub(crate) fn layout(
	manifest: &mut Manifest, header_size: u64, compress: bool, seal: Option<(&Cipher, &crypto::NonceBytes)>,
) -> InternalResult<Vec<u8>> {
	manifest.files.iter_mut().for_each(|e| e.offset = PLACEHOLDER_OFFSET);
	let mut assumed = manifest::encode(manifest, compress, seal)?.len();

	for pass in 1..=MAX_LAYOUT_PASSES {
		let mut cursor = header_size + assumed as u64;
		for entry in manifest.files.iter_mut() {
			entry.offset = cursor;
			cursor += entry.length;
		}

		let encoded = manifest::encode(manifest, compress, seal)?;
		debug!("Layout pass {}: assumed {} bytes, encoded {} bytes", pass, assumed, encoded.len());

		match encoded.len().cmp(&assumed) {
			Ordering::Equal => return Ok(encoded),
			Ordering::Less => return manifest::encode_padded(manifest, compress, seal, assumed - encoded.len()),
			Ordering::Greater => {
				warn!("Manifest grew from {} to {} bytes, re-assigning offsets", assumed, encoded.len());
				assumed = encoded.len();
			},
		}
	}

	Err(InternalError::ManifestDidNotConverge(MAX_LAYOUT_PASSES))
}

/// Packs every file under `input_dir` (recursively) into an archive at `output`.
/// Entry paths are relative to `input_dir`, with forward slashes. The archive is written to a temporary
/// file next to `output` and only moved over it once complete.
///
/// Returns the total number of bytes written.
pub fn pack_directory(
	input_dir: impl AsRef<Path>, output: impl AsRef<Path>, config: &BuilderConfig,
) -> InternalResult<u64> {
	let (input_dir, output) = (input_dir.as_ref(), output.as_ref());

	if !input_dir.is_dir() {
		return Err(InternalError::IOError(io::Error::new(
			io::ErrorKind::NotFound,
			format!("Input directory not found: {}", input_dir.display()),
		)));
	}

	let mut leaves = Vec::new();
	// Symlinked files and folders are packed as what they point to
	for entry in walkdir::WalkDir::new(input_dir).follow_links(true) {
		let entry = entry.map_err(io::Error::from)?;
		if !entry.file_type().is_file() {
			continue;
		}

		let relative = entry.path().strip_prefix(input_dir).unwrap_or(entry.path());
		let path = relative
			.components()
			.filter_map(|c| match c {
				Component::Normal(part) => Some(part.to_string_lossy()),
				_ => None,
			})
			.collect::<Vec<_>>()
			.join("/");

		// The whole file is buffered, the packer is not a streaming writer
		let mut data = Vec::new();
		File::open(entry.path())?.read_to_end(&mut data)?;

		leaves.push(Leaf::new(Cursor::new(data), path));
	}

	info!("Packing {} files from {}", leaves.len(), input_dir.display());

	let parent = match output.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut temporary = tempfile::NamedTempFile::new_in(parent)?;
	let bytes_written = {
		let mut writer = BufWriter::new(temporary.as_file_mut());
		let bytes_written = dump(&mut writer, &mut leaves, config, None)?;
		writer.flush()?;
		bytes_written
	};

	#[cfg(unix)]
	temporary.as_file().set_permissions(archive_permissions(output))?;

	temporary.persist(output).map_err(|err| InternalError::IOError(err.error))?;
	info!("Wrote {} bytes to {}", bytes_written, output.display());

	Ok(bytes_written)
}
