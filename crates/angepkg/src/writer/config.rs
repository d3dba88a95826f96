#[cfg(feature = "multithreaded")]
use std::num::NonZeroUsize;

use crate::crypto::ArchiveKey;

/// Settings for [`dump`](crate::writer::dump) and [`pack_directory`](crate::writer::pack_directory)
#[derive(Debug, Clone, Default)]
pub struct BuilderConfig {
	/// Number of threads used to process leaves during [`dump`](crate::writer::dump), `None` lets `rayon` decide
	#[cfg(feature = "multithreaded")]
	pub num_threads: Option<NonZeroUsize>,
	/// Gzip the manifest, and every leaf regardless of its own [`compress`](crate::builder::Leaf::compress) field
	pub compress: bool,
	/// Seal the manifest, and every leaf regardless of its own [`encrypt`](crate::builder::Leaf::encrypt) field
	pub encrypt: bool,
	/// Key used for all encryption. Required when anything is encrypted
	pub key: Option<ArchiveKey>,
}

// Helper functions
impl BuilderConfig {
	/// Setter for the `key` field
	///```
	/// use angepkg::prelude::{ArchiveKey, BuilderConfig};
	///
	/// let key = ArchiveKey::generate(256).unwrap();
	/// let config = BuilderConfig::default().key(key).encrypt(true);
	///```
	pub fn key(mut self, key: ArchiveKey) -> Self {
		self.key = Some(key);
		self
	}

	/// Setter for the `compress` field
	pub fn compress(mut self, compress: bool) -> Self {
		self.compress = compress;
		self
	}

	/// Setter for the `encrypt` field
	pub fn encrypt(mut self, encrypt: bool) -> Self {
		self.encrypt = encrypt;
		self
	}

	/// Setter for the `num_threads` field
	#[cfg(feature = "multithreaded")]
	pub fn threads(mut self, num_threads: NonZeroUsize) -> Self {
		self.num_threads = Some(num_threads);
		self
	}
}
