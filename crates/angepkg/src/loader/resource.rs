use std::{
	fmt,
	io::{self, Cursor, Read, Seek, SeekFrom},
};

use crate::global::manifest::ManifestEntry;

/// Contains decoded data from an archive entry, and the [`ManifestEntry`] describing it.
/// Implements [`Read`] and [`Seek`] over the decoded bytes.
#[derive(Debug)]
pub struct Resource {
	/// The manifest entry this resource was decoded from
	pub entry: ManifestEntry,
	pub(crate) data: Cursor<Vec<u8>>,
}

impl Resource {
	pub(crate) fn new(entry: ManifestEntry, data: Vec<u8>) -> Resource {
		Resource {
			entry,
			data: Cursor::new(data),
		}
	}

	/// The entry's path, as stored in the manifest
	#[inline(always)]
	pub fn path(&self) -> &str {
		&self.entry.path
	}

	/// Length of the decoded data
	#[inline(always)]
	pub fn len(&self) -> usize {
		self.data.get_ref().len()
	}

	/// `true` for zero length resources
	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The whole decoded data, independent of the read position
	#[inline(always)]
	pub fn as_slice(&self) -> &[u8] {
		self.data.get_ref()
	}

	/// Consume the [`Resource`] and take the decoded data
	pub fn into_inner(self) -> Vec<u8> {
		self.data.into_inner()
	}
}

impl Read for Resource {
	#[inline(always)]
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.data.read(buf)
	}
}

impl Seek for Resource {
	#[inline(always)]
	fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
		self.data.seek(pos)
	}
}

impl fmt::Display for Resource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"[Resource] path: {}, size: {}B, compressed: {}, encrypted: {}",
			self.entry.path,
			self.len(),
			self.entry.compressed,
			self.entry.encrypted
		)
	}
}
