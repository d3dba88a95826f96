use std::{
	collections::HashMap,
	fs::{self, File},
	io::{self, BufReader, Read, Seek, SeekFrom},
	path::Path,
	sync::{Mutex, PoisonError},
};

use log::{debug, trace};

use super::resource::Resource;
use crate::crypto::{ArchiveKey, Cipher};
use crate::global::{
	compressor::Compressor,
	error::*,
	flags::Flags,
	header::Header,
	manifest::{self, lookup_key, Manifest, ManifestEntry},
};

/// Parses an Archive from a read handle.
/// > Wraps handle in a [`Mutex`] internally for shared access, use [`fetch_mut`](Archive::fetch_mut) for lock-free access.
#[derive(Debug)]
pub struct Archive<T> {
	/// The lock is only held for the seek and read of raw bytes, decryption and decompression happen outside it
	handle: Mutex<T>,

	header: Header,
	manifest: Manifest,
	// lookup_key(path) -> index into manifest.files
	index: HashMap<String, usize>,

	cipher: Option<Cipher>,
}

impl<T> std::fmt::Display for Archive<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let bytes: u64 = self.manifest.files.iter().map(|e| e.length).sum();

		write!(
			f,
			"[Archive Header] Version: {}, Members: {}, Stored Size: {bytes}B, Manifest: {}B, Header-Flags: <{:#x} : {:#010b}>",
			self.header.version,
			self.manifest.files.len(),
			self.header.manifest_length,
			self.header.flags.bits,
			self.header.flags.bits,
		)
	}
}

impl<T> Archive<T> {
	/// Consume the [Archive] and return the underlying handle
	pub fn into_inner(self) -> T {
		self.handle.into_inner().unwrap_or_else(PoisonError::into_inner)
	}

	/// Lookup an entry by path. Case-insensitive, and `\` matches `/`
	pub fn find_entry(&self, path: impl AsRef<str>) -> Option<&ManifestEntry> {
		self.index
			.get(&lookup_key(path.as_ref()))
			.map(|idx| &self.manifest.files[*idx])
	}

	/// All entries, in archive order
	#[inline(always)]
	pub fn entries(&self) -> &[ManifestEntry] {
		&self.manifest.files
	}

	/// Global flags extracted from the `Header` section of the source
	#[inline(always)]
	pub fn flags(&self) -> &Flags {
		&self.header.flags
	}

	/// Packing time, seconds since the unix epoch
	#[inline(always)]
	pub fn created(&self) -> u64 {
		self.manifest.created
	}

	/// Size of the stored manifest, as declared in the header
	#[inline(always)]
	pub fn manifest_length(&self) -> u64 {
		self.header.manifest_length as u64
	}

	/// Size of the header, 21 bytes or 33 for encrypted manifests
	#[inline(always)]
	pub fn header_size(&self) -> u64 {
		self.header.size() as u64
	}

	// Decrypt and|or decompress the data
	#[inline(never)]
	fn process(&self, entry: &ManifestEntry, raw: Vec<u8>) -> InternalResult<Vec<u8>> {
		// 1: Decryption layer
		let decrypted = if entry.encrypted {
			let cipher = self.cipher.as_ref().ok_or(InternalError::MissingKey)?;
			match (&entry.nonce, &entry.tag) {
				(Some(nonce), Some(tag)) => cipher.decrypt(nonce, &raw, tag, None)?,
				_ => {
					return Err(InternalError::CorruptManifest(format!(
						"Encrypted entry {} lacks a nonce or tag",
						entry.path
					)))
				},
			}
		} else {
			raw
		};

		// 2: Decompression layer
		if entry.compressed {
			let mut target = Vec::with_capacity(decrypted.len() * 2);
			Compressor::new(decrypted.as_slice())
				.decompress(&mut target)
				.map_err(|err| InternalError::CorruptEntry {
					path: entry.path.clone(),
					reason: err.to_string(),
				})?;

			Ok(target)
		} else {
			Ok(decrypted)
		}
	}
}

impl Archive<BufReader<File>> {
	/// Opens the archive at `path`, with an optional key for encrypted content
	pub fn open(path: impl AsRef<Path>, key: Option<&ArchiveKey>) -> InternalResult<Archive<BufReader<File>>> {
		let file = File::open(path.as_ref())?;
		debug!("Opening archive: {}", path.as_ref().display());

		Archive::with_key(BufReader::new(file), key)
	}
}

impl<T> Archive<T>
where
	T: Seek + Read,
{
	/// Parses an [`Archive`] from the given source, without a key. Encrypted manifests fail with [`MissingKey`](InternalError::MissingKey)
	pub fn new(handle: T) -> InternalResult<Archive<T>> {
		Archive::with_key(handle, None)
	}

	/// Parses an [`Archive`], with an optional [`ArchiveKey`] used for the manifest and for entries.
	pub fn with_key(mut handle: T, key: Option<&ArchiveKey>) -> InternalResult<Archive<T>> {
		let source_length = handle.seek(SeekFrom::End(0))?;

		// Start reading from the start of the input
		handle.seek(SeekFrom::Start(0))?;

		let header = Header::from_handle(&mut handle)?;
		header.validate()?;

		let manifest_start = header.size() as u64;
		let manifest_length = header.manifest_length as u64;

		if manifest_start + manifest_length > source_length {
			return Err(InternalError::TruncatedData);
		}

		let mut bytes = vec![0u8; manifest_length as usize];
		handle.read_exact(&mut bytes)?;

		let cipher = key.map(ArchiveKey::cipher);
		let manifest = manifest::decode(
			&bytes,
			header.flags.contains(Flags::MANIFEST_COMPRESSED),
			header.flags.contains(Flags::MANIFEST_ENCRYPTED),
			cipher.as_ref(),
			header.manifest_nonce.as_ref(),
		)?;

		let index = Archive::<T>::check_layout(&manifest, manifest_start + manifest_length, source_length)?;
		debug!(
			"Loaded manifest: {} entries, {} bytes, {}",
			manifest.files.len(),
			manifest_length,
			header.flags
		);

		Ok(Archive {
			handle: Mutex::new(handle),
			header,
			manifest,
			index,
			cipher,
		})
	}

	// Entries must tile the payload region exactly: in order, contiguous, ending at the end of the source
	fn check_layout(manifest: &Manifest, payload_start: u64, source_length: u64) -> InternalResult<HashMap<String, usize>> {
		let mut index = HashMap::with_capacity(manifest.files.len());
		let mut cursor = payload_start;

		for (idx, entry) in manifest.files.iter().enumerate() {
			if entry.offset != cursor {
				return Err(InternalError::CorruptManifest(format!(
					"Entry {} starts at {}, expected {}",
					entry.path, entry.offset, cursor
				)));
			}

			if entry.encrypted && (entry.nonce.is_none() || entry.tag.is_none()) {
				return Err(InternalError::CorruptManifest(format!(
					"Encrypted entry {} lacks a nonce or tag",
					entry.path
				)));
			}

			if index.insert(lookup_key(&entry.path), idx).is_some() {
				return Err(InternalError::CorruptManifest(format!("Duplicate entry path: {}", entry.path)));
			}

			cursor = entry
				.offset
				.checked_add(entry.length)
				.ok_or_else(|| InternalError::CorruptManifest(format!("Entry {} overflows", entry.path)))?;
		}

		match cursor.cmp(&source_length) {
			std::cmp::Ordering::Equal => Ok(index),
			std::cmp::Ordering::Greater => Err(InternalError::TruncatedData),
			std::cmp::Ordering::Less => Err(InternalError::CorruptManifest(format!(
				"{} trailing bytes after the last entry",
				source_length - cursor
			))),
		}
	}

	/// Given a data source and a [`ManifestEntry`], gets the adjacent raw data
	pub(crate) fn read_raw(handle: &mut T, entry: &ManifestEntry) -> InternalResult<Vec<u8>> {
		trace!("Reading {} bytes at {} for {}", entry.length, entry.offset, entry.path);

		let mut buffer = vec![0u8; entry.length as usize];
		handle.seek(SeekFrom::Start(entry.offset))?;
		handle.read_exact(&mut buffer)?;

		Ok(buffer)
	}

	/// Reads and decodes the given entry.
	/// > Locks the underlying [`Mutex`] for the duration of the raw read only
	pub fn open_stream(&self, entry: &ManifestEntry) -> InternalResult<Resource> {
		let raw = {
			let mut guard = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
			Archive::read_raw(&mut *guard, entry)?
		};

		let data = self.process(entry, raw)?;
		Ok(Resource::new(entry.clone(), data))
	}

	/// Fetch a decoded [`Resource`] by path, failing with [`EntryNotFound`](InternalError::EntryNotFound)
	/// > Locks the underlying [`Mutex`], for a cheaper non-locking operation refer to `Archive::fetch_mut`
	pub fn fetch(&self, path: impl AsRef<str>) -> InternalResult<Resource> {
		match self.find_entry(&path) {
			Some(entry) => self.open_stream(entry),
			None => Err(InternalError::EntryNotFound(path.as_ref().to_string())),
		}
	}

	/// Cheaper alternative to [`fetch`](Archive::fetch) that doesn't lock the underlying [Mutex]
	pub fn fetch_mut(&mut self, path: impl AsRef<str>) -> InternalResult<Resource> {
		let entry = match self.find_entry(&path) {
			Some(entry) => entry.clone(),
			None => return Err(InternalError::EntryNotFound(path.as_ref().to_string())),
		};

		let handle = self.handle.get_mut().unwrap_or_else(PoisonError::into_inner);
		let raw = Archive::read_raw(handle, &entry)?;
		let data = self.process(&entry, raw)?;

		Ok(Resource::new(entry, data))
	}

	/// Decodes the entry at `path` into the file `output`, creating parent directories as needed.
	/// Returns the number of bytes written
	pub fn extract_to(&self, path: impl AsRef<str>, output: impl AsRef<Path>) -> InternalResult<u64> {
		let mut resource = self.fetch(path)?;
		let output = output.as_ref();

		if let Some(parent) = output.parent() {
			fs::create_dir_all(parent)?;
		}

		let mut file = File::create(output)?;
		let written = io::copy(&mut resource, &mut file)?;

		Ok(written)
	}
}
