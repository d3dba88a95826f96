use std::io::Read;

use log::trace;

use crate::crypto::{self, Cipher};
use crate::global::{compressor::Compressor, error::*, manifest::ManifestEntry};

/// A named ([`path`](Leaf::path)) wrapper around an [`io::Read`](Read) handle, tagged with how it should be stored.
#[derive(Debug, Default, Clone)]
pub struct Leaf<R = &'static [u8]> {
	/// source data
	pub handle: R,

	/// The relative path under which the embedded data will be referenced, backslashes are stored as forward slashes
	pub path: String,
	/// Gzip the data before (optional) encryption
	pub compress: bool,
	/// Seal the data with AES-GCM, requires a key in the [`BuilderConfig`](crate::builder::BuilderConfig)
	pub encrypt: bool,
}

impl<R: Read + Send> Leaf<R> {
	/// Creates a new [`Leaf`] wrapping around the given [`Read`] handle, with a path
	pub fn new<S: AsRef<str>>(handle: R, path: S) -> Leaf<R> {
		Leaf {
			handle,
			path: path.as_ref().replace('\\', "/"),
			compress: false,
			encrypt: false,
		}
	}

	/// Copy all fields from another [`Leaf`], except for `handle` and `path`.
	pub fn template<R2>(self, other: &Leaf<R2>) -> Self {
		Leaf {
			handle: self.handle,
			path: self.path,
			compress: other.compress,
			encrypt: other.encrypt,
		}
	}

	/// Setter for the [`compress`](Leaf::compress) field
	pub fn compress(mut self, compress: bool) -> Self {
		self.compress = compress;
		self
	}

	/// Setter for the [`encrypt`](Leaf::encrypt) field
	pub fn encrypt(mut self, encrypt: bool) -> Self {
		self.encrypt = encrypt;
		self
	}
}

// Processed data ready to be laid out and written
pub(crate) struct ProcessedLeaf {
	pub(crate) data: Vec<u8>,
	pub(crate) entry: ManifestEntry,
}

// Process Leaf into stored bytes, externalised for multithreading purposes
#[inline(never)]
pub(crate) fn process_leaf<R: Read + Send>(
	leaf: &mut Leaf<R>, compress: bool, encrypt: bool, cipher: Option<&Cipher>,
) -> InternalResult<ProcessedLeaf> {
	let mut raw = Vec::new();

	// Compression comes first
	if compress {
		Compressor::new(&mut leaf.handle).compress(&mut raw)?;
	} else {
		leaf.handle.read_to_end(&mut raw)?;
	}

	let mut entry = ManifestEntry {
		path: leaf.path.clone(),
		compressed: compress,
		..ManifestEntry::default()
	};

	// Encryption comes second
	if encrypt {
		let cipher = cipher.ok_or(InternalError::MissingKey)?;
		let nonce = crypto::random_nonce();

		let (sealed, tag) = cipher.encrypt(&nonce, &raw, None)?;
		raw = sealed;

		entry.encrypted = true;
		entry.nonce = Some(nonce);
		entry.tag = Some(tag);
	}

	entry.length = raw.len() as u64;
	trace!("Processed {} into {} stored bytes", entry.path, entry.length);

	Ok(ProcessedLeaf { data: raw, entry })
}
