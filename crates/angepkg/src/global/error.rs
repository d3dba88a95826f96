use std::{error, io};
use thiserror::Error;

/// Internal `Result` type alias used by `angepkg`. Basically equal to: `Result<T, InternalError>`
pub type InternalResult<T = ()> = Result<T, InternalError>;

/// All errors manifestable within `angepkg` collected into a neat enum
#[derive(Debug, Error)]
pub enum InternalError {
	/// Generic Error
	#[error("[AngepkgError::GenericError] {0}")]
	OtherError(Box<dyn error::Error + Send + Sync>),
	/// thin wrapper over [io::Error](std::io::Error), captures all IO errors except early EOF, see [`TruncatedData`](InternalError::TruncatedData)
	#[error("[AngepkgError::IOError] {0}")]
	IOError(io::Error),
	/// invalid MAGIC sequence in the given source, hinting at corruption or possible incompatibility with the given source
	#[error("[AngepkgError::FormatError] Invalid magic found in Header, possible incompatibility with given source. Magic found {0:?}")]
	MalformedArchiveSource([u8; crate::MAGIC_LENGTH]),
	/// current loader attempted to load an incompatible version, contains the incompatible source's version
	#[error("[AngepkgError::FormatError] The provided archive source has version: {}. While the current implementation has a format-version: {}. The provided source is incompatible!", .0, crate::VERSION)]
	IncompatibleArchiveVersion(u32),
	/// the header declares a manifest length that no valid archive can have
	#[error("[AngepkgError::FormatError] Invalid manifest length in Header: {0}")]
	InvalidManifestLength(i64),
	/// attempted to set, or found, a bit in the reserved bit range, [`Flags::RESERVED_MASK`](crate::prelude::Flags::RESERVED_MASK)
	#[error("[AngepkgError::FormatError] Tried to set reserved bit(s)!")]
	RestrictedFlagAccess,
	/// the manifest could not be decompressed, deserialized or does not describe the archive's layout
	#[error("[AngepkgError::CorruptManifest] {0}")]
	CorruptManifest(String),
	/// an entry payload failed to decompress
	#[error("[AngepkgError::CorruptEntry] Unable to decode entry: {path}. Reason: {reason}")]
	CorruptEntry {
		/// path of the offending entry
		path: String,
		/// what the decoder reported
		reason: String,
	},
	/// encrypted content was encountered but no key was supplied
	#[error("[AngepkgError::MissingKey] Unable to continue with cryptographic operation, as no key was supplied")]
	MissingKey,
	/// an AES-GCM tag did not verify: the data was tampered with or the key is wrong
	#[error("[AngepkgError::AuthenticationFailure] Authentication tag mismatch, the data was tampered with or the wrong key was supplied")]
	AuthenticationFailure,
	/// the source ended before a complete read
	#[error("[AngepkgError::TruncatedData] Unexpected end of data")]
	TruncatedData,
	/// the entry was not found
	#[error("[AngepkgError::EntryNotFound] Entry not found: {0}")]
	EntryNotFound(String),
	/// a key has a length other than 16, 24 or 32 bytes, contains the offending length
	#[error("[AngepkgError::InvalidKey] Keys must be 16, 24 or 32 bytes long, got: {0} bytes")]
	InvalidKey(usize),
	/// a key could not be parsed from its textual form
	#[error("[AngepkgError::InvalidKey] {0}")]
	KeyParse(String),
	/// two leaves found with the same path (case-insensitively), each leaf should have a unique path
	#[error("[AngepkgError::DuplicateEntryPath] A leaf with the path: {0} already exists. Paths are compared case-insensitively")]
	DuplicateEntryPath(String),
	/// the manifest's size kept changing while offsets were assigned
	#[error("[AngepkgError::ManifestDidNotConverge] Manifest layout did not reach a fixed point after {0} passes")]
	ManifestDidNotConverge(usize),
}

impl From<io::Error> for InternalError {
	fn from(err: io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::UnexpectedEof => InternalError::TruncatedData,
			_ => InternalError::IOError(err),
		}
	}
}
